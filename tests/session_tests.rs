use billcart::application::checkout::CheckoutOrchestrator;
use billcart::application::reconcile::PaidStatusReconciler;
use billcart::application::session::BillingSession;
use billcart::domain::bill::{BillQuery, BillSource, SelectableBill};
use billcart::domain::ports::{BillDirectoryBox, BillingLedgerBox};
use billcart::infrastructure::in_memory::{InMemoryBillDirectory, InMemoryLedger, ScriptedGateway};
use rust_decimal_macros::dec;

fn bill(source: BillSource, id: &str, bill_no: &str, amount: &str) -> SelectableBill {
    SelectableBill {
        source,
        id: id.to_string(),
        bill_no: Some(bill_no.to_string()),
        amount: amount.parse().unwrap(),
        due_date: None,
        description: None,
        meta: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_cross_source_cart_totals_and_purge() {
    let a1 = bill(BillSource::Assessment, "A1", "B1", "120.00");
    let c1 = bill(BillSource::Compound, "C1", "B2", "50.00");
    let directory = InMemoryBillDirectory::with_bills(vec![a1.clone(), c1.clone()]);
    let ledger = InMemoryLedger::new();
    let session = BillingSession::new(
        Box::new(directory),
        PaidStatusReconciler::new(Box::new(ledger.clone())),
        CheckoutOrchestrator::new(Box::new(ScriptedGateway::new())),
    );

    assert!(session.select(a1.clone()).await);
    assert!(session.select(c1).await);
    assert_eq!(session.selection().total().await, dec!(170.00));
    assert_eq!(session.selection().count().await, 2);

    // The assessment bill gets paid at a counter; the next refresh must
    // evict it from the cart.
    ledger.mark_paid("B1", None).await;
    session
        .refresh(
            BillSource::Assessment,
            &BillQuery::Ic("900101-01-1234".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(session.selection().count().await, 1);
    assert_eq!(session.selection().total().await, dec!(50.00));
    assert!(!session.selection().has(&a1.key()).await);
}

#[tokio::test]
async fn test_ports_are_usable_as_trait_objects_across_tasks() {
    let directory: BillDirectoryBox = Box::new(InMemoryBillDirectory::with_bills(vec![bill(
        BillSource::Booth,
        "ST-1",
        "B1",
        "30.00",
    )]));
    let ledger: BillingLedgerBox = Box::new(InMemoryLedger::new());

    let handle = tokio::spawn(async move {
        let session = BillingSession::new(
            directory,
            PaidStatusReconciler::new(ledger),
            CheckoutOrchestrator::new(Box::new(ScriptedGateway::new())),
        );
        session
            .refresh(
                BillSource::Booth,
                &BillQuery::AccountNo("ACC-1".to_string()),
            )
            .await
            .unwrap()
            .unwrap()
    });

    let fetched = handle.await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, "ST-1");
}

#[tokio::test]
async fn test_paid_map_replaced_wholesale_per_refresh() {
    let a1 = bill(BillSource::Assessment, "A1", "B1", "10.00");
    let m1 = bill(BillSource::Misc, "M1", "B9", "5.00");
    let directory = InMemoryBillDirectory::with_bills(vec![a1, m1]);
    let ledger = InMemoryLedger::new();
    ledger.mark_paid("B1", None).await;
    ledger.mark_paid("B9", None).await;
    let session = BillingSession::new(
        Box::new(directory),
        PaidStatusReconciler::new(Box::new(ledger)),
        CheckoutOrchestrator::new(Box::new(ScriptedGateway::new())),
    );

    let query = BillQuery::Ic("900101-01-1234".to_string());
    session.refresh(BillSource::Assessment, &query).await.unwrap();
    assert!(session.is_paid("B1").await);
    assert!(!session.is_paid("B9").await, "B9 not part of this fetch");

    // The misc refresh replaces the map; B1's entry is gone with it.
    session.refresh(BillSource::Misc, &query).await.unwrap();
    assert!(session.is_paid("B9").await);
    assert!(!session.is_paid("B1").await);
}
