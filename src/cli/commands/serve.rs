//! Control API command.

use watchwarm::config::Settings;

/// Start the control API.
pub async fn cmd_serve(
    settings: &Settings,
    host: Option<&str>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (default_host, default_port) = parse_bind_address(&settings.listen)?;
    let host = host.map(bracket_host).unwrap_or(default_host);
    let port = port.unwrap_or(default_port);

    eprintln!("Warming {} from http://{}:{}", settings.base_url, host, port);
    eprintln!("  Press Ctrl+C to stop");

    watchwarm::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8787" -> 127.0.0.1:8787
/// - Just a host: "0.0.0.0" or "[::1]" -> host:8787
/// - Host and port: "0.0.0.0:3131" or "[::1]:3131"
///
/// IPv6 hosts must be bracketed; the brackets are kept so the pair formats
/// back into a valid socket address.
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if bind.starts_with('[') {
        let end = bind
            .find(']')
            .ok_or_else(|| anyhow::anyhow!("Unclosed IPv6 bracket in listen address: {}", bind))?;
        let (host, rest) = bind.split_at(end + 1);
        return match rest.strip_prefix(':') {
            Some(port_str) => Ok((host.to_string(), parse_port(bind, port_str)?)),
            None if rest.is_empty() => Ok((host.to_string(), 8787)),
            None => anyhow::bail!("Invalid listen address: {}", bind),
        };
    }

    match bind.matches(':').count() {
        0 => Ok((bind.to_string(), 8787)),
        1 => {
            let (host, port_str) = bind.split_once(':').unwrap_or((bind, ""));
            Ok((host.to_string(), parse_port(bind, port_str)?))
        }
        _ => anyhow::bail!(
            "IPv6 listen addresses must be bracketed, e.g. [{}]:8787",
            bind
        ),
    }
}

fn parse_port(bind: &str, port_str: &str) -> anyhow::Result<u16> {
    port_str
        .parse::<u16>()
        .map_err(|_| anyhow::anyhow!("Invalid port in listen address: {}", bind))
}

/// Bracket a bare IPv6 `--host` so it joins with a port.
fn bracket_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    }
}
