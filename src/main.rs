use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use wbtc_swap::{
    config::AppConfig,
    controller::SwapController,
    local::{LocalBitcoinSigner, LocalWallet, LoggingExecutor},
    models::{Side, SubmitOutcome},
    utils,
};

const HELP: &str = "commands: wbtc <amount> | btc <amount> | direction <WBTC_TO_BTC|BTC_TO_WBTC> \
| address <btc address> | connect | disconnect | sign | swap | show | help | quit";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    tracing::info!(
        network = ?config.network,
        wbtc = %config.registry.wbtc,
        btc = %config.registry.btc,
        direction = %config.direction,
        "[INIT] wbtc-swap starting"
    );

    let wallet = Arc::new(LocalWallet::new(config.evm_account_address.clone()));
    let signer = Arc::new(LocalBitcoinSigner::new(config.btc_address.clone()));
    let executor = Arc::new(LoggingExecutor::default());
    let mut controller = SwapController::new(&config, wallet.clone(), signer.clone(), executor);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some((cmd, arg)) = utils::split_command(&line) else {
            continue;
        };
        match cmd.as_str() {
            "wbtc" | "btc" => {
                let side = if cmd == "wbtc" { Side::Wbtc } else { Side::Btc };
                if !controller.edit(side, arg) {
                    println!("{cmd} is read-only in this direction");
                }
                let pair = controller.snapshot().pair;
                println!(
                    "WBTC: {}  BTC: {}",
                    pair.wbtc.as_deref().unwrap_or(""),
                    pair.btc.as_deref().unwrap_or("")
                );
            }
            "direction" => match arg.parse() {
                Ok(direction) => controller.toggle_direction(direction),
                Err(e) => println!("{e}"),
            },
            "address" => {
                if !controller.edit_receive_address(arg) {
                    println!("receive address is read-only in this direction");
                }
            }
            "connect" => {
                if let Err(e) = controller.connect().await {
                    println!("connect failed: {e}");
                }
            }
            "disconnect" => {
                wallet.disconnect();
                controller.refresh_lookups();
            }
            "sign" => {
                signer.sign();
                controller.refresh_lookups();
            }
            "swap" => {
                if !controller.can_submit() {
                    println!("connect the wallet first");
                    continue;
                }
                match controller.submit() {
                    SubmitOutcome::Submitted(request) => println!(
                        "submitted {} -> {}: {} / {}",
                        request.send_asset,
                        request.receive_asset,
                        request.send_amount_base_units,
                        request.receive_amount_base_units
                    ),
                    SubmitOutcome::Skipped(reason) => println!("nothing to swap: {reason}"),
                    SubmitOutcome::Failed { error, .. } => println!("swap failed: {error}"),
                }
            }
            "show" => println!("{}", controller.snapshot().to_json()?),
            "help" => println!("{HELP}"),
            "quit" | "exit" => break,
            other => println!("unknown command {other:?}; {HELP}"),
        }
    }

    tracing::info!("[INIT] wbtc-swap stopped");
    Ok(())
}
