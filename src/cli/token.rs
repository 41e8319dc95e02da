use anyhow::{anyhow, Result};
use chrono::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::server::TokenKeys;

pub fn run(config: &Config, user: Uuid, ttl_hours: i64) -> Result<()> {
    let secret = config
        .jwt_secret()
        .ok_or_else(|| anyhow!("JWT secret is not configured; set JWT_SECRET or auth.jwt_secret"))?;
    let ttl = Duration::try_hours(ttl_hours)
        .ok_or_else(|| anyhow!("--ttl-hours {} is out of range", ttl_hours))?;
    let token = TokenKeys::new(&secret).issue(user, ttl)?;
    println!("{}", token);
    Ok(())
}
