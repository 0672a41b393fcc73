//! Argument handling for the agent binary.

pub const DEFAULT_PORT: u16 = 8080;

pub fn usage(prog: &str) -> String {
    format!("Usage: {prog} [--port PORT|-p PORT]  (env: SYSDECK_AGENT_TOKEN, RUST_LOG)")
}

pub fn wants_help<I: IntoIterator<Item = String>>(args: I) -> bool {
    args.into_iter().any(|a| a == "-h" || a == "--help")
}

/// `--port` wins over `-p`; anything unparsable falls back to `default_port`.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}
