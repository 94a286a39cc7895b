//! Issue a session token for a user id, signed with the configured secret.
//!
//! Usage: `token <user> [ttl_hours]`

use dotenvy::dotenv;

use service::SessionTokens;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let mut args = std::env::args().skip(1);
    let user = args.next().ok_or_else(|| anyhow::anyhow!("usage: token <user> [ttl_hours]"))?;

    let cfg = configs::AppConfig::load_or_env()?;
    let ttl = match args.next() {
        Some(h) => h.parse::<i64>().map_err(|e| anyhow::anyhow!("ttl_hours: {e}"))?,
        None => cfg.auth.token_ttl_hours,
    };

    let token = SessionTokens::new(cfg.auth.jwt_secret, ttl).issue(&user)?;
    println!("{token}");
    Ok(())
}
