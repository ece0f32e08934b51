use anyhow::Result;
use log::{error, info};

use crate::{
    bybit::{BybitClient, CoinBalance},
    config::Config,
    logger::{setup_logger, ReportLog},
    telegram::Telegram,
};

mod accounts;
mod bybit;
mod config;
mod logger;
mod sign;
mod telegram;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing credentials are the only fatal error, everything after this
    // point is logged and the run continues.
    let cfg = Config::load_from_args()?;
    setup_logger(cfg.log_level);

    let report = ReportLog::new(&cfg.log_file, cfg.quiet);

    if !cfg.skip_telegram {
        let telegram = Telegram::new(&cfg.credentials.telegram_bot_token);
        match telegram.check().await {
            Ok(username) => report!(report, "Telegram bot connected as @{username}"),
            Err(e) => error!("Telegram connectivity check failed: {e}"),
        }
    }

    let client = BybitClient::new(&cfg)?;

    report!(report, "Main account ({}):", cfg.account_type);
    match client.wallet_balance(&cfg.account_type).await {
        Ok(balances) => print_balances(&report, &balances),
        Err(e) => error!("Error fetching main account balance: {e}"),
    }

    let members = match client.sub_members().await {
        Ok(members) => members,
        Err(e) => {
            error!("Error listing sub-accounts: {e}");
            Vec::new()
        }
    };
    report!(report, "Sub-accounts: {}", members.len());

    for member in &members {
        let name = cfg.names.resolve(&member.uid, &member.username);
        report!(report, "{name} (uid {}):", member.uid);
        match client.account_coins_balance(&cfg.account_type, Some(&member.uid)).await {
            Ok(balances) => print_balances(&report, &balances),
            Err(e) => error!("Error fetching balance for {name}: {e}"),
        }
    }

    info!("Done");
    Ok(())
}

fn print_balances(report: &ReportLog, balances: &[CoinBalance]) {
    let mut any = false;
    for balance in balances.iter().filter(|b| b.has_funds()) {
        report!(
            report,
            "  {}: balance {}, available {}",
            balance.coin,
            balance.wallet_balance,
            balance.available_balance
        );
        any = true;
    }
    if !any {
        report!(report, "  (no non-zero balances)");
    }
}

// eof
