use billcart::application::checkout::{CheckoutConfig, CheckoutOrchestrator};
use billcart::application::reconcile::PaidStatusReconciler;
use billcart::application::resolver::PayerResolver;
use billcart::application::session::BillingSession;
use billcart::domain::bill::{BillQuery, BillSource, LedgerItem, SelectableBill};
use billcart::domain::checkout::CheckoutResponse;
use billcart::domain::payer::{PayerProfile, UserProfile};
use billcart::infrastructure::in_memory::{
    InMemoryBillDirectory, InMemoryLedger, InMemoryUserDirectory, ScriptedGateway,
};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Demo session against an in-memory backend: fetch every source,
/// reconcile, select all unpaid bills, and check the cart out.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON fixture with bills, ledger items, scripted gateway replies and
    /// user-directory entries.
    fixture: PathBuf,

    /// IC number used as the lookup query for every source.
    #[arg(long, default_value = "900101-01-1234")]
    ic: String,

    #[arg(long, default_value = "")]
    payer_name: String,

    #[arg(long, default_value = "")]
    payer_email: String,

    #[arg(long, default_value = "")]
    payer_mobile: String,

    /// Concurrent paid-status lookups per reconciliation pass.
    #[arg(long, default_value_t = 8)]
    reconcile_concurrency: usize,

    #[arg(long, default_value_t = 20)]
    fetch_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    checkout_timeout_secs: u64,
}

#[derive(Deserialize, Default)]
struct Fixture {
    #[serde(default)]
    bills: Vec<SelectableBill>,
    #[serde(default)]
    ledger: Vec<LedgerItem>,
    /// Scripted gateway replies, consumed one per checkout attempt. When
    /// absent the simulated gateway accepts the first attempt.
    #[serde(default)]
    gateway: Vec<CheckoutResponse>,
    #[serde(default)]
    users: Vec<UserProfile>,
}

const SOURCES: [BillSource; 4] = [
    BillSource::Assessment,
    BillSource::Compound,
    BillSource::Booth,
    BillSource::Misc,
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.fixture).into_diagnostic()?;
    let fixture: Fixture = serde_json::from_str(&raw).into_diagnostic()?;

    let directory = InMemoryBillDirectory::with_bills(fixture.bills);
    let ledger = InMemoryLedger::new();
    for item in fixture.ledger {
        ledger.push(item).await;
    }
    let gateway = ScriptedGateway::new();
    if fixture.gateway.is_empty() {
        gateway.push_url("https://payments.example/session").await;
    }
    for reply in fixture.gateway {
        gateway.push_response(reply).await;
    }

    let reconciler =
        PaidStatusReconciler::new(Box::new(ledger)).with_concurrency(cli.reconcile_concurrency);
    let orchestrator = CheckoutOrchestrator::new(Box::new(gateway)).with_config(CheckoutConfig {
        max_attempts: 2,
        call_timeout: Duration::from_secs(cli.checkout_timeout_secs),
    });
    let session = BillingSession::new(Box::new(directory), reconciler, orchestrator)
        .with_fetch_timeout(Duration::from_secs(cli.fetch_timeout_secs));

    let query = BillQuery::Ic(cli.ic.clone());
    for source in SOURCES {
        match session.refresh(source, &query).await {
            Ok(Some(bills)) => {
                let added = session.select_all_unpaid(&bills).await;
                println!("{source}: {} outstanding, {added} selected", bills.len());
            }
            Ok(None) => {}
            // A failed source never blocks the others.
            Err(err) => eprintln!("warning: {err}"),
        }
    }

    for member in session.selection().snapshot().await {
        println!("  [{}] {} RM{:.2}", member.source, member.label(), member.amount);
    }
    println!(
        "Selected {} bill(s), total RM{:.2}",
        session.selection().count().await,
        session.selection().total().await
    );

    let resolver = PayerResolver::new(Box::new(InMemoryUserDirectory::with_users(fixture.users)));
    let payer = resolver
        .resolve(PayerProfile::new(
            cli.payer_name,
            cli.payer_email,
            cli.payer_mobile,
        ))
        .await;

    let redirect = session.checkout(&payer).await.into_diagnostic()?;
    // Brief pause before the handoff, like the payment page shows.
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!(
        "Redirecting to {} (reference {})",
        redirect.url, redirect.reference
    );

    Ok(())
}
