use anyhow::{Context, bail};
use price_feed::FeedConfig;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Per-connection settings for streaming sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between keep-alive pings on an idle socket.
    pub keepalive_interval: Duration,
    /// Batches queued per subscriber before deliveries start failing.
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(60),
            outbound_buffer: 32,
        }
    }
}

/// Process configuration, read from `TICKER_*` environment variables.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    /// (username, password) pairs allowed to connect.
    pub users: Vec<(String, String)>,
    pub session: SessionConfig,
    pub feed: FeedConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            users: vec![("admin".to_string(), "changeme".to_string())],
            session: SessionConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("TICKER_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("TICKER_BIND_ADDR: invalid socket address {addr:?}"))?;
        }
        if let Some(users) = lookup("TICKER_USERS") {
            config.users = parse_users(&users).context("TICKER_USERS")?;
        }
        if let Some(ms) = lookup("TICKER_TICK_INTERVAL_MS") {
            let ms: u64 = ms.parse().context("TICKER_TICK_INTERVAL_MS")?;
            config.feed.tick_interval = Duration::from_millis(ms);
        }
        if let Some(step) = lookup("TICKER_MAX_STEP") {
            config.feed.max_step = step.parse().context("TICKER_MAX_STEP")?;
        }
        if let Some(seed) = lookup("TICKER_SEED") {
            config.feed.seed = Some(seed.parse().context("TICKER_SEED")?);
        }
        if let Some(symbols) = lookup("TICKER_SYMBOLS") {
            config.feed.symbols = parse_symbols(&symbols).context("TICKER_SYMBOLS")?;
        }
        if let Some(secs) = lookup("TICKER_KEEPALIVE_SECS") {
            let secs: u64 = secs.parse().context("TICKER_KEEPALIVE_SECS")?;
            config.session.keepalive_interval = Duration::from_secs(secs);
        }
        if let Some(size) = lookup("TICKER_OUTBOUND_BUFFER") {
            config.session.outbound_buffer = size.parse().context("TICKER_OUTBOUND_BUFFER")?;
        }

        if config.session.keepalive_interval.is_zero() {
            bail!("TICKER_KEEPALIVE_SECS must be positive");
        }
        if config.session.outbound_buffer == 0 {
            bail!("TICKER_OUTBOUND_BUFFER must be positive");
        }
        config.feed.validate()?;
        Ok(config)
    }
}

/// `alice:secret,bob:hunter2`
fn parse_users(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    let users = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((user, pass)) if !user.is_empty() && !pass.is_empty() => {
                Ok((user.to_string(), pass.to_string()))
            }
            _ => bail!("expected user:password, got {entry:?}"),
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    if users.is_empty() {
        bail!("at least one user is required");
    }
    Ok(users)
}

/// `AAPL=180.00,MSFT=380`
fn parse_symbols(raw: &str) -> anyhow::Result<Vec<(String, Decimal)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (symbol, price) = entry
                .split_once('=')
                .with_context(|| format!("expected SYMBOL=price, got {entry:?}"))?;
            let price = Decimal::from_str(price.trim())
                .with_context(|| format!("invalid price for {symbol}"))?;
            Ok((symbol.trim().to_string(), price))
        })
        .collect()
}
