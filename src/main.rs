// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use multichain_wallet::blockchain::{BitcoinClient, ChainId, EthereumClient, SolanaClient};
use multichain_wallet::config::WalletConfig;
use multichain_wallet::logging::init_logging;
use multichain_wallet::{
    BalanceAggregator, BalanceSnapshot, Bip39MnemonicService, SessionManager, WalletError,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<WalletError>() {
                Some(wallet) => wallet.user_message(),
                None => e.to_string(),
            };
            error!(error = %e, "Wallet exited with an error");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = WalletConfig::from_env()?;

    let aggregator = BalanceAggregator::new(
        Arc::new(EthereumClient::new(config.ethereum.clone())?),
        Arc::new(SolanaClient::new(config.solana.clone())?),
        Arc::new(BitcoinClient::new(config.bitcoin.clone())?),
    )
    .with_config(config.aggregator_config());

    let manager = SessionManager::new(Arc::new(Bip39MnemonicService::new()), aggregator)
        .with_refresh_interval(config.refresh_interval);

    match &config.mnemonic {
        Some(mnemonic) => manager.login(mnemonic.as_str()).await?,
        None => {
            let mnemonic = manager.create_new()?;
            println!("Your new recovery phrase (write it down and keep it secret):\n");
            for (i, word) in mnemonic.words().enumerate() {
                println!("  {:>2}. {word}", i + 1);
            }
            println!();
            manager.confirm_and_login().await?;
        }
    }

    if let Some(session) = manager.session() {
        for chain in ChainId::ALL {
            println!("{:<8} {}", chain.name(), session.address(chain));
        }
    }

    let mut updates = manager.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_snapshot(&snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    manager.logout();
    Ok(())
}

fn print_snapshot(snapshot: &BalanceSnapshot) {
    println!("\nBalances at {}", snapshot.refreshed_at.format("%H:%M:%S UTC"));
    for chain in ChainId::ALL {
        let balance = snapshot.get(chain);
        let note = if balance.is_known() {
            String::new()
        } else {
            format!("  ({:?})", balance.status())
        };
        println!(
            "  {:<4} {:>18.9}{note}",
            chain.symbol(),
            balance.amount()
        );
    }
}
