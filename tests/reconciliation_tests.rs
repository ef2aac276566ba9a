use payrecon::application::reconciler::OrderReconciler;
use payrecon::application::service::ReconciliationService;
use payrecon::domain::method::{BANK_TRANSFER, IDEAL};
use payrecon::domain::money::Money;
use payrecon::domain::order::{Order, OrderState, PaymentLeg};
use payrecon::domain::ports::{OrderCriteria, OrderStore};
use payrecon::domain::transaction::{GatewayTransaction, RedirectOutcome};
use payrecon::domain::urls::UrlProvider;
use payrecon::error::ReconcileError;
use payrecon::infrastructure::in_memory::{
    InMemoryCheckoutSession, InMemoryCommentHistory, InMemoryNotifier, InMemoryOrderStore,
};
use payrecon::infrastructure::settings::Settings;
use rust_decimal_macros::dec;
use serde_json::json;

struct Shop {
    store: InMemoryOrderStore,
    notifier: InMemoryNotifier,
    comments: InMemoryCommentHistory,
    session: InMemoryCheckoutSession,
    service: ReconciliationService,
}

fn shop(orders: Vec<Order>) -> Shop {
    let settings = Settings {
        base_url: "https://shop.example/".to_string(),
        ..Settings::default()
    };
    let store = InMemoryOrderStore::with_orders(orders);
    let notifier = InMemoryNotifier::new();
    let comments = InMemoryCommentHistory::new();
    let session = InMemoryCheckoutSession::new();

    let reconciler = OrderReconciler::new(
        Box::new(store.clone()),
        Box::new(notifier.clone()),
        Box::new(comments.clone()),
        Box::new(settings.clone()),
        Box::new(session.clone()),
        UrlProvider::new(&settings.base_url).unwrap(),
    );

    Shop {
        store,
        notifier,
        comments,
        session,
        service: ReconciliationService::new(reconciler),
    }
}

fn order(id: u64, method: &str, transaction_id: &str) -> Order {
    let mut order = Order::new(id, format!("{id:09}"), PaymentLeg::new(method));
    order.quote_id = Some(id + 100);
    order.customer_email = format!("customer{id}@example.nl");
    order.gateway_transaction_id = Some(transaction_id.to_string());
    order
}

fn transaction(value: serde_json::Value) -> GatewayTransaction {
    serde_json::from_value(value).unwrap()
}

async fn stored(shop: &Shop, id: u64) -> Order {
    shop.store
        .load(OrderCriteria::ById(id))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_completed_webhook_captures_and_notifies() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let tx = transaction(json!({ "id": "gw-1", "status": "completed", "amount": 10050 }));

    let result = shop.service.handle_webhook(&tx).await.unwrap();
    assert!(result.success);
    assert_eq!(result.status, "complete");

    let order = stored(&shop, 1).await;
    assert_eq!(order.payment.amount_paid, Money::new(dec!(100.50)));
    assert_eq!(order.state, OrderState::Processing);
    assert_eq!(order.status, "processing");
    assert!(order.email_sent);
    assert_eq!(shop.notifier.order_emails(), vec![1]);
    assert_eq!(shop.notifier.invoice_emails(), vec![1]);
    assert_eq!(
        shop.comments
            .comments()
            .iter()
            .filter(|comment| comment.notify_customer)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_virtual_order_completes() {
    let mut virtual_order = order(1, IDEAL, "gw-1");
    virtual_order.is_virtual = true;
    let shop = shop(vec![virtual_order]);
    let tx = transaction(json!({ "id": "gw-1", "status": "completed", "amount": 500 }));

    shop.service.handle_webhook(&tx).await.unwrap();
    assert_eq!(stored(&shop, 1).await.state, OrderState::Complete);
}

#[tokio::test]
async fn test_redelivered_completed_webhook_is_a_no_op() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let tx = transaction(json!({ "id": "gw-1", "status": "completed", "amount": 10050 }));

    shop.service.handle_webhook(&tx).await.unwrap();
    let after_first = stored(&shop, 1).await;
    shop.service.handle_webhook(&tx).await.unwrap();
    let after_second = stored(&shop, 1).await;

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.invoices.len(), 1);
    assert_eq!(shop.notifier.order_emails(), vec![1]);
    assert_eq!(shop.notifier.invoice_emails(), vec![1]);
}

#[tokio::test]
async fn test_cancelled_webhook_cancels_once() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let tx = transaction(json!({ "id": "gw-1", "status": "cancelled" }));

    let result = shop.service.handle_webhook(&tx).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.status, "cancelled");
    assert!(result.cart_msg.unwrap().contains("cancelled"));

    let cancelled = stored(&shop, 1).await;
    assert_eq!(cancelled.state, OrderState::Canceled);

    shop.service.handle_webhook(&tx).await.unwrap();
    assert_eq!(stored(&shop, 1).await, cancelled);
}

#[tokio::test]
async fn test_failed_return_leaves_order_alone() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let before = stored(&shop, 1).await;
    let tx = transaction(json!({ "id": "gw-1", "status": "expired" }));

    let result = shop.service.handle_return(&tx).await.unwrap();
    assert!(!result.success);
    assert!(result.cart_msg.unwrap().contains("expired"));
    assert_eq!(stored(&shop, 1).await, before);
}

#[tokio::test]
async fn test_successful_return_remembers_last_order() {
    let shop = shop(vec![order(7, IDEAL, "gw-7")]);
    let tx = transaction(json!({ "id": "gw-7", "status": "completed" }));

    let result = shop.service.handle_return(&tx).await.unwrap();
    assert!(result.success);

    let last = shop.session.last_order().unwrap();
    assert_eq!(last.order_id, 7);
    assert_eq!(last.quote_id, Some(107));
    assert_eq!(stored(&shop, 7).await.payment.amount_paid, Money::ZERO);
}

#[tokio::test]
async fn test_unknown_status_reports_raw_status() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let before = stored(&shop, 1).await;
    let tx = transaction(json!({ "id": "gw-1", "status": "chargeback" }));

    let result = shop.service.handle_webhook(&tx).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.status, "chargeback");
    assert_eq!(stored(&shop, 1).await, before);
}

#[tokio::test]
async fn test_bank_transfer_flow() {
    let mut pending = order(2, BANK_TRANSFER, "unused");
    pending.gateway_transaction_id = None;
    let shop = shop(vec![pending]);

    let started = transaction(json!({
        "id": "gw-2",
        "status": "initialized",
        "amount": 2599,
        "transactions": [{ "payment_method_details": { "reference": "RF18 5390" } }]
    }));
    let outcome = shop
        .service
        .start_redirect(2, Some(&started), None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RedirectOutcome::Redirect("https://shop.example/checkout/process?order_id=gw-2".to_string())
    );

    let processing = transaction(json!({ "id": "gw-2", "status": "processing" }));
    let result = shop.service.handle_webhook(&processing).await.unwrap();
    assert!(result.success);
    assert_eq!(shop.notifier.order_emails(), vec![2]);

    let completed = transaction(json!({ "id": "gw-2", "status": "completed", "amount": 2599 }));
    shop.service.handle_webhook(&completed).await.unwrap();

    let order = stored(&shop, 2).await;
    assert_eq!(order.payment.amount_paid, Money::new(dec!(25.99)));
    assert!(order.payment.info("mailing_address").unwrap().contains("RF18 5390"));
    assert_eq!(shop.notifier.order_emails(), vec![2]);
}

#[tokio::test]
async fn test_redirect_without_transaction() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);

    let outcome = shop.service.start_redirect(1, None, None).await.unwrap();
    assert_eq!(
        outcome,
        RedirectOutcome::Error("could not fetch redirect url".to_string())
    );
}

#[tokio::test]
async fn test_missing_order() {
    let shop = shop(vec![]);
    let tx = transaction(json!({ "id": "gw-404", "status": "completed" }));

    let result = shop.service.handle_webhook(&tx).await;
    assert!(matches!(result, Err(ReconcileError::OrderNotFound(_))));
}

#[tokio::test]
async fn test_payload_without_id_is_rejected() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    let tx = transaction(json!({ "status": "completed" }));

    let result = shop.service.handle_webhook(&tx).await;
    assert!(matches!(result, Err(ReconcileError::ValidationError(_))));
}

#[tokio::test]
async fn test_notifier_failure_does_not_block_capture() {
    let shop = shop(vec![order(1, IDEAL, "gw-1")]);
    shop.notifier.fail_next();
    let tx = transaction(json!({ "id": "gw-1", "status": "completed", "amount": 1000 }));

    let result = shop.service.handle_webhook(&tx).await.unwrap();
    assert!(result.success);

    let order = stored(&shop, 1).await;
    assert_eq!(order.payment.amount_paid, Money::new(dec!(10.00)));
    assert!(!order.email_sent);
    assert_eq!(order.status, "processing");
    assert_eq!(shop.notifier.invoice_emails(), vec![1]);
}
