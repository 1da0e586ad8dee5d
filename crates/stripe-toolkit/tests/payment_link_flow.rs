//! End-to-end turns: scripted model, in-memory payment provider.

use std::sync::Arc;

use agent_core::{Role, ScriptedProvider, Session, TurnOrchestrator, TurnRole};
use stripe_toolkit::{
    Actions, MockPaymentProvider, ONE_SHOT_ASSIGNMENT, ORDERING_HINT, PaymentProvider,
    StripeAgentToolkit, extract_link,
};

fn tool_reply(tool: &str, arguments: &str) -> String {
    format!("```tool\n{{\"tool\": \"{tool}\", \"arguments\": {arguments}}}\n```")
}

fn orchestrator(
    llm: &Arc<ScriptedProvider>,
    payments: &Arc<MockPaymentProvider>,
) -> TurnOrchestrator {
    let payments: Arc<dyn PaymentProvider> = payments.clone();
    StripeAgentToolkit::new(payments, Actions::default())
        .orchestrator(llm.clone(), "scripted")
        .unwrap()
}

#[tokio::test]
async fn test_one_shot_assignment_ends_with_checkout_link() {
    let llm = Arc::new(ScriptedProvider::new([
        tool_reply("create_product", r#"{"name": "Test"}"#),
        tool_reply(
            "create_price",
            r#"{"product": "prod_mock_1", "unit_amount": 10000, "currency": "usd"}"#,
        ),
        tool_reply("create_payment_link", r#"{"price": "price_mock_1", "quantity": 1}"#),
        "Your payment link is ready: https://checkout.stripe.com/c/pay/plink_mock_1.".into(),
    ]));
    let payments = Arc::new(MockPaymentProvider::new());

    let turn = orchestrator(&llm, &payments)
        .run_once(ONE_SHOT_ASSIGNMENT)
        .await
        .unwrap();

    assert!(!turn.failed());
    assert_eq!(
        extract_link(turn.content()).as_deref(),
        Some("https://checkout.stripe.com/c/pay/plink_mock_1")
    );

    // each step ran against the id returned by the previous one
    let prices = payments.prices().await;
    assert_eq!(prices.len(), 1);
    assert_eq!(prices[0].product, "prod_mock_1");
    assert_eq!(prices[0].unit_amount, 10_000);
    assert_eq!(payments.links().await.len(), 1);

    // the model saw the instructions, the assignment, then three tool results
    let requests = llm.requests().await;
    assert_eq!(requests.len(), 4);
    let last = &requests[3];
    assert_eq!(last[0].role, Role::System);
    assert!(last[0].content.contains("create_payment_link"));
    assert_eq!(last[1].content, ONE_SHOT_ASSIGNMENT);
    assert_eq!(last.iter().filter(|m| m.role == Role::Tool).count(), 3);
    assert_eq!(llm.remaining().await, 0);
}

#[tokio::test]
async fn test_missing_price_ends_turn_with_hint_and_session_continues() {
    let llm = Arc::new(ScriptedProvider::new([
        tool_reply("create_payment_link", r#"{"price": "price_123"}"#),
        "Sorry about that. Tell me the product name and price and I'll start over.".into(),
    ]));
    let payments = Arc::new(MockPaymentProvider::new());
    let orchestrator = orchestrator(&llm, &payments);
    let mut session = Session::new();

    let turn = orchestrator
        .submit(&mut session, "Make a payment link for price_123")
        .await
        .unwrap();

    assert!(turn.failed());
    assert!(turn.content().starts_with("Error: "));
    assert!(turn.content().contains("No such price: 'price_123'"));
    assert!(turn.content().ends_with(ORDERING_HINT));
    assert_eq!(extract_link(turn.content()), None);
    assert_eq!(session.transcript().len(), 2);

    let next = orchestrator
        .submit(&mut session, "OK, what should I do?")
        .await
        .unwrap();
    assert!(!next.failed());
    assert_eq!(session.transcript().len(), 4);

    let roles: Vec<_> = session.transcript().iter().map(|t| t.role()).collect();
    assert_eq!(
        roles,
        [TurnRole::User, TurnRole::Assistant, TurnRole::User, TurnRole::Assistant]
    );
}

#[tokio::test]
async fn test_reply_without_link_has_nothing_to_render() {
    let llm = Arc::new(ScriptedProvider::new([
        "Which currency should the price use?",
    ]));
    let payments = Arc::new(MockPaymentProvider::new());

    let turn = orchestrator(&llm, &payments)
        .run_once("Sell a T-shirt")
        .await
        .unwrap();

    assert!(!turn.failed());
    assert_eq!(extract_link(turn.content()), None);
    assert!(payments.products().await.is_empty());
}

#[tokio::test]
async fn test_malformed_tool_arguments_are_fed_back_to_the_model() {
    let llm = Arc::new(ScriptedProvider::new([
        tool_reply("create_price", r#"{"product": "prod_mock_1"}"#),
        "I need the amount before I can create the price.".into(),
    ]));
    let payments = Arc::new(MockPaymentProvider::new());

    let turn = orchestrator(&llm, &payments)
        .run_once("Price my product")
        .await
        .unwrap();

    assert!(!turn.failed());
    let requests = llm.requests().await;
    let feedback = requests[1].last().unwrap();
    assert_eq!(feedback.role, Role::Tool);
    assert!(feedback.content.contains("Missing required parameter: unit_amount"));
}
