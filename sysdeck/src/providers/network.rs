//! Interface counters from sysinfo and socket tables from /proc/net.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use sysinfo::Networks;

use crate::error::FetchError;
use crate::types::{Connection, NetStats, Protocol};

pub fn interfaces(nets: &mut Networks) -> Vec<NetStats> {
    nets.refresh(true);
    let mut list: Vec<NetStats> = nets
        .iter()
        .map(|(name, data)| NetStats {
            interface: name.to_string(),
            bytes_sent: data.total_transmitted(),
            bytes_recv: data.total_received(),
            packets_sent: data.total_packets_transmitted(),
            packets_recv: data.total_packets_received(),
            errors_in: data.total_errors_on_received(),
            errors_out: data.total_errors_on_transmitted(),
        })
        .collect();
    list.sort_by(|a, b| a.interface.cmp(&b.interface));
    list
}

/// One parsed row of a /proc/net socket table.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketRow {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub status: String,
    pub inode: u64,
}

pub fn tcp_state(code: &str) -> &'static str {
    match code {
        "01" => "ESTABLISHED",
        "02" => "SYN_SENT",
        "03" => "SYN_RECV",
        "04" => "FIN_WAIT1",
        "05" => "FIN_WAIT2",
        "06" => "TIME_WAIT",
        "07" => "CLOSE",
        "08" => "CLOSE_WAIT",
        "09" => "LAST_ACK",
        "0A" => "LISTEN",
        "0B" => "CLOSING",
        _ => "UNKNOWN",
    }
}

/// "0100007F:0035" -> 127.0.0.1:53. The address words are host-order (little
/// endian) u32s; the port is plain big-endian hex.
pub fn parse_hex_addr(s: &str) -> Option<SocketAddr> {
    let (addr, port) = s.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;
    let ip = match addr.len() {
        8 => {
            let word = u32::from_str_radix(addr, 16).ok()?;
            IpAddr::V4(Ipv4Addr::from(word.to_le_bytes()))
        }
        32 => {
            let mut bytes = [0u8; 16];
            for (i, chunk) in bytes.chunks_mut(4).enumerate() {
                let word = u32::from_str_radix(addr.get(i * 8..i * 8 + 8)?, 16).ok()?;
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(bytes))
        }
        _ => return None,
    };
    Some(SocketAddr::new(ip, port))
}

/// Parse the text of /proc/net/{tcp,tcp6,udp,udp6}. Malformed rows are skipped.
pub fn parse_socket_table(text: &str, protocol: Protocol) -> Vec<SocketRow> {
    text.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let local = parse_hex_addr(fields[1])?;
            let remote = parse_hex_addr(fields[2])?;
            let status = match protocol {
                Protocol::Tcp | Protocol::Tcp6 => tcp_state(fields[3]).to_string(),
                Protocol::Udp | Protocol::Udp6 => "NONE".to_string(),
            };
            let inode = fields[9].parse().ok()?;
            Some(SocketRow {
                local,
                remote,
                status,
                inode,
            })
        })
        .collect()
}

/// "socket:[12345]" -> 12345
pub fn socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
}

#[cfg(target_os = "linux")]
pub fn connections(limit: usize) -> Result<Vec<Connection>, FetchError> {
    use std::collections::HashMap;
    use std::{fs, io};

    const TABLES: [(&str, Protocol); 4] = [
        ("/proc/net/tcp", Protocol::Tcp),
        ("/proc/net/tcp6", Protocol::Tcp6),
        ("/proc/net/udp", Protocol::Udp),
        ("/proc/net/udp6", Protocol::Udp6),
    ];

    let mut rows = Vec::new();
    let mut read_any = false;
    for (path, proto) in TABLES {
        match fs::read_to_string(path) {
            Ok(text) => {
                read_any = true;
                rows.extend(
                    parse_socket_table(&text, proto)
                        .into_iter()
                        .map(|r| (proto, r)),
                );
            }
            // IPv6 may be compiled out
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if !read_any {
        return Err(FetchError::Unreachable("no /proc/net socket tables".into()));
    }

    // inode -> owning pid; other users' fds are unreadable and simply missing
    let mut owners: HashMap<u64, u32> = HashMap::new();
    for entry in fs::read_dir("/proc")?.flatten() {
        let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let Ok(fds) = fs::read_dir(entry.path().join("fd")) else {
            continue;
        };
        for fd in fds.flatten() {
            if let Ok(target) = fs::read_link(fd.path()) {
                if let Some(inode) = target.to_str().and_then(socket_inode) {
                    owners.entry(inode).or_insert(pid);
                }
            }
        }
    }

    Ok(rows
        .into_iter()
        .take(limit)
        .map(|(protocol, r)| Connection {
            protocol,
            status: r.status,
            local: r.local,
            remote: r.remote,
            pid: owners.get(&r.inode).copied(),
        })
        .collect())
}

#[cfg(not(target_os = "linux"))]
pub fn connections(_limit: usize) -> Result<Vec<Connection>, FetchError> {
    Err(FetchError::Unsupported("socket tables need /proc"))
}
