//! Full delivery attempts against a scripted page.

mod common;

use common::{date, fast_config, write_pdf, FakeUi};
use courier_delivery::attach::AttachmentPipeline;
use courier_delivery::compose::SendController;
use courier_delivery::conversation::ConversationLocator;
use courier_delivery::diagnostics::Diagnostics;
use courier_delivery::session::SessionManager;
use courier_delivery::{
    ArtifactError, AttachStrategy, DeliveryError, DeliveryOrchestrator, DeliveryOutcome,
    SelectorBook, SessionState,
};
use courier_ledger::{open_default, MemorySentStore, SentDateStore};
use courier_types::DeliveryTask;
use tempfile::tempdir;

/// Script a page that carries one delivery from cold load to verified send.
fn happy_page() -> FakeUi {
    let book = SelectorBook::default();
    let ui = FakeUi::new();

    // Inbox landmark flickers twice during load, then holds for the three
    // consecutive polls the session gate demands.
    ui.script_visibility(&book.ready_landmarks[0], vec![true, false, true, true, true]);

    ui.set_visible(&book.exact_chat_result("Sales group"), true);
    ui.set_visible(&book.compose_box[0], true);

    ui.set_visible(&book.attach_buttons[0], true);
    ui.set_visible(&book.document_menu_items[0], true);
    ui.set_visible(&book.caption_inputs[0], true);
    ui.set_visible(&book.send_buttons[0], true);

    // Verification: baseline outgoing count is read once before the send,
    // then every poll sees one more message with full evidence on it.
    ui.script_count(&book.outgoing_messages, vec![5, 6]);
    ui.set_visible(&book.checkmarks[0], true);
    ui.set_visible(&book.document_indicators[0], true);
    ui.set_text(
        &book.last_outgoing_message,
        "sales_report_2025-03-01.pdf \u{2022} 1 page \u{2022} PDF \u{2022} Sales report of 2025-03-01",
    );
    ui
}

fn task_for(pdf: &std::path::Path) -> DeliveryTask {
    DeliveryTask::new(
        pdf,
        "Sales group",
        "Sales report of 2025-03-01",
        date("2025-03-01"),
    )
}

#[tokio::test]
async fn delivers_and_records_the_date() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let ledger_path = dir.path().join("sent_dates.txt");

    let ui = happy_page();
    let mut store = open_default(&ledger_path);
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let outcome = orchestrator.deliver(&mut store, &task_for(&pdf)).await.unwrap();
    assert_eq!(
        outcome,
        DeliveryOutcome::Delivered {
            strategy_used: AttachStrategy::FileChooserViaMenu,
        }
    );

    assert_eq!(ui.navigations(), vec!["https://web.whatsapp.com"]);
    assert!(ui.typed().contains(&"Sales group".to_string()));
    assert!(ui.typed().contains(&"Sales report of 2025-03-01".to_string()));

    // The artifact went through the intercepted chooser, never a raw input.
    assert_eq!(ui.chooser_files().len(), 1);
    assert_eq!(ui.chooser_files()[0].1, pdf);
    assert!(ui.direct_files().is_empty());

    let ledger = std::fs::read_to_string(&ledger_path).unwrap();
    assert_eq!(ledger, "2025-03-01\n");
}

#[tokio::test]
async fn recorded_date_skips_without_touching_the_browser() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");

    let ui = FakeUi::new();
    let mut store = MemorySentStore::with_dates([date("2025-03-01")]);
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let outcome = orchestrator.deliver(&mut store, &task_for(&pdf)).await.unwrap();
    assert_eq!(outcome, DeliveryOutcome::SkippedAlreadySent);

    assert!(ui.navigations().is_empty());
    assert!(ui.clicks().is_empty());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn invalid_artifact_aborts_before_the_browser() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let empty = dir.path().join("empty.pdf");
    std::fs::write(&empty, b"").unwrap();

    let ui = FakeUi::new();
    let mut store = MemorySentStore::new();
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let err = orchestrator
        .deliver(&mut store, &task_for(&empty))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DeliveryError::Artifact(ArtifactError::Empty { .. })
    ));
    assert!(ui.navigations().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn authentication_wait_outlives_the_load_timeout() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    // The code stays on screen for longer than the whole load budget; the
    // session must keep waiting, then resume the load from a fresh deadline
    // once the indicator clears.
    let ui = FakeUi::new();
    let mut auth_polls = vec![true; 1500];
    auth_polls.push(false);
    ui.script_visibility(&book.auth_pending[0], auth_polls);
    ui.set_visible(&book.ready_landmarks[0], true);

    let started = std::time::Instant::now();
    let session = SessionManager::new(&ui, &book, &config.session, &diagnostics);
    let state = session.establish("https://web.whatsapp.com").await.unwrap();

    assert_eq!(state, SessionState::Ready);
    assert!(
        started.elapsed() > config.session.load_timeout(),
        "the scan wait should have outlasted the configured load timeout"
    );
}

#[tokio::test]
async fn caption_typing_failure_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    let ui = FakeUi::new();
    ui.set_visible(&book.caption_inputs[0], true);
    ui.fail_typing_after(0);

    let sender = SendController::new(&ui, &book, &config.send, &diagnostics);
    let typed = sender.type_caption("Sales report of 2025-03-01").await.unwrap();
    assert!(!typed);
}

#[tokio::test]
async fn delivery_proceeds_without_a_caption() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let ledger_path = dir.path().join("sent_dates.txt");

    // Typing works once (the search box) and then breaks, so the caption
    // step degrades to a warning while the send still goes through.
    let ui = happy_page();
    ui.fail_typing_after(1);
    let mut store = open_default(&ledger_path);
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let outcome = orchestrator.deliver(&mut store, &task_for(&pdf)).await.unwrap();
    assert!(matches!(outcome, DeliveryOutcome::Delivered { .. }));

    assert_eq!(ui.typed(), vec!["Sales group".to_string()]);
    let ledger = std::fs::read_to_string(&ledger_path).unwrap();
    assert_eq!(ledger, "2025-03-01\n");
}

#[tokio::test]
async fn unclickable_exact_result_falls_back_to_first_row() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    let exact = book.exact_chat_result("Sales group");
    let ui = FakeUi::new();
    ui.set_visible(&book.search_inputs[0], true);
    ui.set_visible(&exact, true);
    ui.break_all_clicks(&exact);
    ui.set_visible(&book.chat_results[0], true);
    ui.set_visible(&book.compose_box[0], true);

    let locator = ConversationLocator::new(&ui, &book, &config.locator, &diagnostics);
    locator.open("Sales group").await.unwrap();

    assert!(ui.clicks().contains(&book.chat_results[0]));
}

#[tokio::test]
async fn session_that_never_settles_times_out() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");

    // Navigation works but no landmark ever shows up.
    let ui = FakeUi::new();
    let mut store = MemorySentStore::new();
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let err = orchestrator
        .deliver(&mut store, &task_for(&pdf))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::SessionLoadTimeout { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_send_control_fails_and_leaves_ledger_alone() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let book = SelectorBook::default();

    let ui = happy_page();
    ui.set_visible(&book.send_buttons[0], false);
    let mut store = MemorySentStore::new();
    let orchestrator = DeliveryOrchestrator::new(&ui, &config);

    let err = orchestrator
        .deliver(&mut store, &task_for(&pdf))
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::SendControlNotFound { .. }));
    assert!(store.is_empty());
}

fn attach_fixture<'a>(
    ui: &'a FakeUi,
    book: &'a SelectorBook,
    config: &'a courier_types::CourierConfig,
    diagnostics: &'a Diagnostics,
) -> AttachmentPipeline<'a, FakeUi> {
    AttachmentPipeline::new(ui, book, &config.attach, diagnostics)
}

#[tokio::test]
async fn document_menu_wins_over_raw_file_input() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    // Both routes exist; the chooser interception must be tried first.
    let ui = FakeUi::new();
    ui.set_visible(&book.attach_buttons[0], true);
    ui.set_visible(&book.document_menu_items[0], true);
    ui.set_count(&book.file_inputs[0], 1);

    let pipeline = attach_fixture(&ui, &book, &config, &diagnostics);
    let result = pipeline.attach(&pdf).await.unwrap();

    assert_eq!(result.strategy_used, AttachStrategy::FileChooserViaMenu);
    assert!(ui.direct_files().is_empty());
}

#[tokio::test]
async fn broken_chooser_falls_back_to_raw_input() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    let ui = FakeUi::new();
    ui.set_visible(&book.attach_buttons[0], true);
    ui.set_visible(&book.document_menu_items[0], true);
    ui.set_count(&book.file_inputs[0], 1);
    ui.break_file_chooser();

    let pipeline = attach_fixture(&ui, &book, &config, &diagnostics);
    let result = pipeline.attach(&pdf).await.unwrap();

    assert_eq!(result.strategy_used, AttachStrategy::DirectInput);
    assert_eq!(ui.direct_files().len(), 1);
    assert_eq!(ui.direct_files()[0].1, pdf);
}

#[tokio::test]
async fn positional_menu_entry_is_the_last_resort() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    // No document entry, no raw inputs, only an anonymous second menu row.
    let ui = FakeUi::new();
    ui.set_visible(&book.attach_buttons[0], true);
    ui.set_visible(&book.menu_second_item[0], true);

    let pipeline = attach_fixture(&ui, &book, &config, &diagnostics);
    let result = pipeline.attach(&pdf).await.unwrap();

    assert_eq!(result.strategy_used, AttachStrategy::MenuPositionFallback);
    assert_eq!(ui.chooser_files().len(), 1);
    assert_eq!(ui.chooser_files()[0].0, book.menu_second_item[0]);
}

#[tokio::test]
async fn all_attach_routes_exhausted_is_a_typed_failure() {
    let dir = tempdir().unwrap();
    let config = fast_config(dir.path());
    let pdf = write_pdf(dir.path(), "sales_report_2025-03-01.pdf");
    let book = SelectorBook::default();
    let diagnostics = Diagnostics::new(dir.path());

    let ui = FakeUi::new();
    ui.set_visible(&book.attach_buttons[0], true);

    let pipeline = attach_fixture(&ui, &book, &config, &diagnostics);
    let err = pipeline.attach(&pdf).await.unwrap_err();
    assert!(matches!(err, DeliveryError::AttachmentFailed { .. }));
}
