//! Mentora Playground - the wallet core exercised end to end
//!
//! Runs a scripted walkthrough against a fully in-memory deployment: wallet
//! creation, coupon administration, a discounted top-up with gateway
//! confirmation and a retried confirmation, a fully-discounted top-up, gated
//! charges to exhaustion, day rollover, refund, withdrawal, and a history
//! listing. Exits non-zero if any step lands in an unexpected state.
//!
//! # Quick Start
//!
//! ```bash
//! # Run with defaults
//! mentora-playground
//!
//! # Different seed and a tighter interview cap
//! mentora-playground --seed 7 --interview-limit 1
//!
//! # More logging
//! RUST_LOG=debug mentora-playground
//! ```

use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use clap::Parser;
use mentora_billing::{BillingConfig, BillingError, BillingService, TopupIntent};
use mentora_coupons::{CouponRejection, Discount, NewCoupon};
use mentora_ledger::TxKind;
use mentora_limiter::{LimitKind, LimiterError};
use mentora_types::{Actor, Clock, ManualClock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mentora Playground - wallets, coupons, and global limits in one run
#[derive(Parser, Debug)]
#[command(
    name = "mentora-playground",
    about = "Scripted walkthrough of the Mentora wallet core",
    version
)]
struct Args {
    /// Seed for the scripted scenario
    #[arg(long, default_value = "42", env = "MENTORA_SEED")]
    seed: u64,

    /// Daily cap on mock interviews during the walkthrough
    #[arg(long, default_value = "2", env = "MENTORA_INTERVIEW_LIMIT")]
    interview_limit: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(seed = args.seed, "mentora playground starting");

    // A manual clock so the walkthrough can cross a day boundary on demand
    let clock = Arc::new(ManualClock::starting_now());

    let mut config = BillingConfig::from_env();
    config
        .daily_limits
        .push((LimitKind::mock_interview(), args.interview_limit));
    let billing = BillingService::in_memory(config, clock.clone()).await?;

    let mut events = billing.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(?event, "wallet event");
        }
    });

    let outcome = run_scenario(&billing, &clock, &args).await;
    listener.abort();
    outcome
}

async fn run_scenario(
    billing: &BillingService,
    clock: &Arc<ManualClock>,
    args: &Args,
) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let admin = Actor::admin("ops");
    let student = Actor::user("student-1");

    // Running tally of what the wallet should hold after each step
    let mut expected = Decimal::ZERO;
    let mut recorded_transactions = 0u64;

    // --- wallet creation ---
    let wallet = billing.wallet(&student.account_id).await?;
    ensure!(wallet.balance == Decimal::ZERO, "new wallet must start empty");
    info!(account = %student.account_id, currency = %wallet.currency, "wallet opened");

    // --- coupon administration ---
    billing
        .create_coupon(
            &admin,
            NewCoupon {
                code: "SAVE10".to_string(),
                description: "10% off top-ups of 100 or more".to_string(),
                discount: Discount::Percentage(dec!(10)),
                max_discount: Some(dec!(50)),
                min_purchase: dec!(100),
                usage_limit: Some(100),
                per_user_limit: 1,
                valid_from: clock.now() - chrono::Duration::days(1),
                valid_to: clock.now() + chrono::Duration::days(30),
            },
        )
        .await?;
    billing
        .create_coupon(
            &admin,
            NewCoupon {
                code: "FIRSTFREE".to_string(),
                description: "First small top-up on the house".to_string(),
                discount: Discount::Percentage(dec!(100)),
                max_discount: None,
                min_purchase: Decimal::ZERO,
                usage_limit: Some(1000),
                per_user_limit: 1,
                valid_from: clock.now() - chrono::Duration::days(1),
                valid_to: clock.now() + chrono::Duration::days(30),
            },
        )
        .await?;
    info!("coupons SAVE10 and FIRSTFREE created");

    // A purchase below the coupon minimum is quoted, not errored
    let quote = billing
        .quote_topup(&student, dec!(50), Some("SAVE10"))
        .await?;
    ensure!(
        quote.reason == Some(CouponRejection::BelowMinPurchase),
        "a 50 purchase must be rejected below the 100 minimum"
    );
    info!(reason = ?quote.reason, "quote for a too-small purchase rejected as expected");

    // --- discounted top-up through the gateway ---
    let intent = billing
        .begin_topup(&student, dec!(500), Some("SAVE10"))
        .await?;
    let TopupIntent::AwaitingPayment {
        transaction_id,
        payable,
        discount,
        ..
    } = intent
    else {
        bail!("a 10% discount must not skip the gateway");
    };
    ensure!(payable == dec!(450), "10% of 500 capped at 50 leaves 450");
    info!(%payable, %discount, "gateway hand-off simulated");

    let gateway_ref = format!("pay_{:08x}", rng.gen::<u32>());
    let receipt = billing
        .confirm_topup(&student, &transaction_id, &gateway_ref)
        .await?;
    expected += dec!(500);
    recorded_transactions += 1;
    ensure!(
        receipt.new_balance == expected,
        "the wallet receives the full pack amount"
    );

    // The client retries the confirmation; nothing is credited twice
    let replay = billing
        .confirm_topup(&student, &transaction_id, &gateway_ref)
        .await?;
    ensure!(replay.new_balance == expected, "replay must not credit again");
    info!(reference = %gateway_ref, "retried confirmation replayed the original receipt");

    // --- fully discounted top-up, no gateway ---
    let intent = billing
        .begin_topup(&student, dec!(200), Some("FIRSTFREE"))
        .await?;
    let TopupIntent::Credited { new_balance, .. } = intent else {
        bail!("a 100% discount must skip the gateway");
    };
    expected += dec!(200);
    recorded_transactions += 1;
    ensure!(new_balance == expected, "free top-up credits the full amount");
    info!(%new_balance, "free top-up credited without gateway involvement");

    // --- gated charges until the daily cap closes ---
    let interviews = LimitKind::mock_interview();
    let mut admitted_today = 0u32;
    loop {
        let fee = Decimal::from(rng.gen_range(100u32..=150));
        match billing
            .charge(
                &student,
                TxKind::InterviewCharge,
                fee,
                "AI mock interview",
                Some(&interviews),
            )
            .await
        {
            Ok(charged) => {
                admitted_today += 1;
                expected -= fee;
                recorded_transactions += 1;
                info!(
                    %fee,
                    admission = ?charged.admission,
                    balance = %charged.receipt.new_balance,
                    "interview charged"
                );
            }
            Err(BillingError::Limiter(LimiterError::LimitExceeded { max, .. })) => {
                ensure!(
                    admitted_today == max,
                    "the gate must close exactly at the cap"
                );
                info!(%max, "daily interview cap reached");
                break;
            }
            Err(other) => return Err(other.into()),
        }
    }
    ensure!(
        billing.balance(&student.account_id).await? == expected,
        "rejected admission must not debit"
    );

    // --- day rollover reopens the gate ---
    clock.advance(chrono::Duration::days(1));
    let fee = Decimal::from(rng.gen_range(100u32..=150));
    let charged = billing
        .charge(
            &student,
            TxKind::InterviewCharge,
            fee,
            "AI mock interview",
            Some(&interviews),
        )
        .await?;
    expected -= fee;
    recorded_transactions += 1;
    info!(
        %fee,
        admission = ?charged.admission,
        "next-day interview admitted after lazy reset"
    );

    // --- refund and withdrawal ---
    billing
        .refund(&student.account_id, fee, "Interview cancelled by mentor")
        .await?;
    expected += fee;
    recorded_transactions += 1;

    billing
        .withdraw(&student, dec!(100), "Referral payout")
        .await?;
    expected -= dec!(100);
    recorded_transactions += 1;

    let balance = billing.balance(&student.account_id).await?;
    ensure!(
        balance == expected,
        "running tally {expected} diverged from wallet balance {balance}"
    );

    // --- history listing ---
    let history = billing
        .transactions(&student.account_id, 1, 20, None)
        .await?;
    ensure!(
        history.total == recorded_transactions,
        "history must hold exactly the committed transactions"
    );
    for transaction in &history.items {
        info!(
            kind = %transaction.kind,
            amount = %transaction.amount,
            balance_after = %transaction.balance_after,
            status = %transaction.status,
            "{}",
            transaction.description
        );
    }

    let summary = billing.wallet(&student.account_id).await?;
    let quotas = billing.limiter_status().await?;
    info!(
        balance = %summary.balance,
        total_topups = %summary.total_topups,
        total_spent = %summary.total_spent,
        interviews_used_today = quotas
            .quotas
            .get(&interviews)
            .map(|q| q.current)
            .unwrap_or(0),
        "walkthrough finished clean"
    );
    Ok(())
}
