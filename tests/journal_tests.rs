use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use indoc::indoc;
use tempfile::TempDir;

use beanjournal::{
    BalanceInput, EntryBody, EntryFilter, EntryInput, Journal, JournalConfig, JournalError,
    NoteInput, Pagination, PostingInput, TransactionInput,
};
use beanjournal_core::DirectiveKind;

const LEDGER: &str = indoc! {r#"
    2024-01-01 * "Store" "Coffee"
      Assets:Cash  -3.50 USD
      Expenses:Coffee  3.50 USD

    2024-01-15 note Assets:Cash "checked"

    2024-02-01 commodity BTC
      name: "Bitcoin"
"#};

fn setup(content: &str) -> (TempDir, PathBuf, Journal) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.journal");
    fs::write(&path, content).unwrap();
    let journal = Journal::open(
        &path,
        JournalConfig {
            create_backups: false,
            max_backups: 0,
        },
    )
    .unwrap();
    (dir, path, journal)
}

fn only_id(journal: &Journal, kind: DirectiveKind) -> String {
    let filter = EntryFilter::builder().kinds(Some(vec![kind])).build();
    let page = journal.entries(&filter, Pagination::default());
    assert_eq!(page.returned_count, 1, "expected exactly one {}", kind);
    page.entries[0].id.clone()
}

fn balance_payload(amount: &str) -> EntryInput {
    EntryInput::Balance(BalanceInput {
        date: "2024-02-01".into(),
        account: "Assets:Cash".into(),
        amount: amount.into(),
        currency: "USD".into(),
        tolerance: None,
    })
}

#[test]
fn lists_the_coffee_transaction() {
    let (_dir, _path, journal) = setup(LEDGER);
    let filter = EntryFilter::builder()
        .kinds(Some(vec![DirectiveKind::Transaction]))
        .build();
    let page = journal.entries(&filter, Pagination::default());
    assert_eq!(page.total_count, 1);
    match &page.entries[0].body {
        EntryBody::Transaction {
            narration,
            postings,
            ..
        } => {
            assert_eq!(narration, "Coffee");
            assert_eq!(postings.len(), 2);
            assert_eq!(postings[0].amount.as_deref(), Some("-3.50"));
            assert_eq!(postings[1].amount.as_deref(), Some("3.50"));
        }
        other => panic!("expected a transaction, got {:?}", other),
    }
}

#[test]
fn create_balance_appends_exact_text() {
    let (_dir, path, journal) = setup(LEDGER);
    let receipt = journal.create_entry(&balance_payload("100.00")).unwrap();
    assert!(receipt.reload_error.is_none());

    let content = fs::read_to_string(&path).unwrap();
    assert!(
        content.ends_with("\n\n2024-02-01 balance Assets:Cash 100.00 USD\n"),
        "content: {}",
        content
    );

    let filter = EntryFilter::builder()
        .kinds(Some(vec![DirectiveKind::Balance]))
        .build();
    assert_eq!(journal.entries(&filter, Pagination::default()).total_count, 1);
}

#[test]
fn delete_note_removes_only_its_line() {
    let (_dir, path, journal) = setup(LEDGER);
    let before: Vec<String> = fs::read_to_string(&path)
        .unwrap()
        .split('\n')
        .map(str::to_string)
        .collect();

    let id = only_id(&journal, DirectiveKind::Note);
    journal.delete_entry(&id).unwrap();

    let after: Vec<String> = fs::read_to_string(&path)
        .unwrap()
        .split('\n')
        .map(str::to_string)
        .collect();
    assert_eq!(after.len(), before.len() - 1);
    // Everything before the deleted line keeps its line number.
    assert_eq!(&after[..4], &before[..4]);
    assert!(!after.iter().any(|l| l.contains("note")));

    // The transaction above still starts on line 1.
    let snapshot = journal.snapshot();
    let txn = snapshot
        .directives
        .iter()
        .find(|d| d.kind() == DirectiveKind::Transaction)
        .unwrap();
    assert_eq!(txn.source().unwrap().line, 1);
}

#[test]
fn delete_unknown_id_is_not_found() {
    let (_dir, _path, journal) = setup(LEDGER);
    let err = journal.delete_entry("no-such-id").unwrap_err();
    assert!(matches!(err, JournalError::NotFound(_)));
}

#[test]
fn update_replaces_the_whole_region() {
    let (_dir, path, journal) = setup(LEDGER);
    let id = only_id(&journal, DirectiveKind::Transaction);
    let payload = EntryInput::Transaction(TransactionInput {
        date: "2024-01-02".into(),
        flag: None,
        payee: Some("Store".into()),
        narration: "Coffee and cake".into(),
        tags: vec![],
        links: vec![],
        postings: vec![
            PostingInput {
                account: "Assets:Cash".into(),
                amount: Some("-7.00".into()),
                currency: Some("USD".into()),
                flag: None,
                comment: None,
            },
            PostingInput {
                account: "Expenses:Coffee".into(),
                amount: Some("3.50".into()),
                currency: Some("USD".into()),
                flag: None,
                comment: None,
            },
            PostingInput {
                account: "Expenses:Snacks".into(),
                amount: Some("3.50".into()),
                currency: Some("USD".into()),
                flag: None,
                comment: None,
            },
        ],
        metadata: BTreeMap::new(),
    });
    let receipt = journal.update_entry(&id, &payload).unwrap();
    assert_ne!(receipt.id, id, "content change must change identity");

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("\"Coffee\"\n"), "old header must be gone");
    assert!(content.contains("2024-01-02 * \"Store\" \"Coffee and cake\""));
    assert!(content.contains("  Expenses:Snacks  3.50 USD"));
    // Neighbors are untouched.
    assert!(content.contains("2024-01-15 note Assets:Cash \"checked\""));
    assert!(content.contains("2024-02-01 commodity BTC"));
}

#[test]
fn update_kind_mismatch_is_rejected() {
    let (_dir, path, journal) = setup(LEDGER);
    let before = fs::read_to_string(&path).unwrap();
    let id = only_id(&journal, DirectiveKind::Note);
    let err = journal.update_entry(&id, &balance_payload("1")).unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn update_twice_with_same_payload_is_idempotent() {
    let (_dir, path, journal) = setup(LEDGER);
    let payload = EntryInput::Note(NoteInput {
        date: "2024-01-15".into(),
        account: "Assets:Cash".into(),
        comment: "verified".into(),
    });

    let id = only_id(&journal, DirectiveKind::Note);
    let receipt = journal.update_entry(&id, &payload).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    // The id changed with the content; the second round addresses the new
    // one.
    journal.update_entry(&receipt.id, &payload).unwrap();
    let second = fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn identity_is_stable_across_loads_and_unrelated_edits() {
    let (_dir, path, journal) = setup(LEDGER);
    let note_id = only_id(&journal, DirectiveKind::Note);
    let txn_id = only_id(&journal, DirectiveKind::Transaction);

    // An unrelated append shifts nothing for existing entries.
    journal.create_entry(&balance_payload("100.00")).unwrap();
    assert_eq!(only_id(&journal, DirectiveKind::Note), note_id);
    assert_eq!(only_id(&journal, DirectiveKind::Transaction), txn_id);

    // A fresh load of the same file computes the same ids.
    let reopened = Journal::open(
        &path,
        JournalConfig {
            create_backups: false,
            max_backups: 0,
        },
    )
    .unwrap();
    assert_eq!(only_id(&reopened, DirectiveKind::Note), note_id);
    assert!(reopened.entry(&txn_id).is_some());
}

#[test]
fn failed_reload_keeps_the_previous_snapshot() {
    let (_dir, path, journal) = setup(LEDGER);
    let note_id = only_id(&journal, DirectiveKind::Note);

    fs::remove_file(&path).unwrap();
    journal.reload().unwrap_err();

    // Readers keep seeing the last good state.
    let snapshot = journal.snapshot();
    assert_eq!(snapshot.directives.len(), 3);
    assert_eq!(only_id(&journal, DirectiveKind::Note), note_id);
}

#[test]
fn update_with_stale_location_falls_back_to_append() {
    let (_dir, path, journal) = setup(LEDGER);
    let id = only_id(&journal, DirectiveKind::Note);

    // The file shrinks underneath the snapshot, so the note's recorded
    // line is now past the end of the file.
    fs::write(
        &path,
        indoc! {r#"
            2024-01-01 * "Store" "Coffee"
              Assets:Cash  -3.50 USD
              Expenses:Coffee  3.50 USD
        "#},
    )
    .unwrap();

    let payload = EntryInput::Note(NoteInput {
        date: "2024-01-15".into(),
        account: "Assets:Cash".into(),
        comment: "verified".into(),
    });
    let receipt = journal.update_entry(&id, &payload).unwrap();
    assert!(receipt.message.contains("appended"), "{}", receipt.message);

    let content = fs::read_to_string(&path).unwrap();
    assert!(
        content.ends_with("\n\n2024-01-15 note Assets:Cash \"verified\"\n"),
        "content: {}",
        content
    );
}

#[test]
fn validation_failure_leaves_file_untouched() {
    let (_dir, path, journal) = setup(LEDGER);
    let before = fs::read_to_string(&path).unwrap();
    let payload = EntryInput::Transaction(TransactionInput {
        date: "2024-01-02".into(),
        flag: None,
        payee: None,
        narration: "half a transfer".into(),
        tags: vec![],
        links: vec![],
        postings: vec![PostingInput {
            account: "Assets:Cash".into(),
            amount: Some("-1.00".into()),
            currency: Some("USD".into()),
            flag: None,
            comment: None,
        }],
        metadata: BTreeMap::new(),
    });
    let err = journal.create_entry(&payload).unwrap_err();
    assert!(matches!(err, JournalError::Validation(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn commodity_update_preserves_header_and_existing_metadata() {
    let (_dir, path, journal) = setup(LEDGER);
    let mut updates = BTreeMap::new();
    updates.insert("logo".to_string(), "btc.png".to_string());
    journal.update_commodity_metadata("BTC", &updates).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("2024-02-01 commodity BTC\n  name: \"Bitcoin\"\n  logo: \"btc.png\""));

    // Overwriting a key keeps its position and the header date.
    let mut updates = BTreeMap::new();
    updates.insert("name".to_string(), "Bitcoin (BTC)".to_string());
    journal.update_commodity_metadata("BTC", &updates).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert!(content
        .contains("2024-02-01 commodity BTC\n  name: \"Bitcoin (BTC)\"\n  logo: \"btc.png\""));
}

#[test]
fn commodity_update_without_declaration_appends_one() {
    let (_dir, path, journal) = setup(LEDGER);
    let mut updates = BTreeMap::new();
    updates.insert("logo".to_string(), "usd.png".to_string());
    journal.update_commodity_metadata("ETH", &updates).unwrap();

    // Dated at the earliest directive date in the ledger.
    let content = fs::read_to_string(&path).unwrap();
    assert!(
        content.ends_with("\n\n2024-01-01 commodity ETH\n  logo: \"usd.png\"\n"),
        "content: {}",
        content
    );
    assert!(journal.commodity("ETH").is_some());
}

#[test]
fn mutations_create_backups_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.journal");
    fs::write(&path, LEDGER).unwrap();
    let journal = Journal::open(&path, JournalConfig::default()).unwrap();

    let original = fs::read_to_string(&path).unwrap();
    let receipt = journal.create_entry(&balance_payload("100.00")).unwrap();
    let backup = receipt.backup.expect("backup expected");
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("main.journal.backup."));
    // The backup holds the pre-write content.
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);
}

#[test]
fn pagination_over_live_journal() {
    let (_dir, _path, journal) = setup(LEDGER);
    for amount in ["10.00", "20.00", "30.00"] {
        journal.create_entry(&balance_payload(amount)).unwrap();
    }

    let page = journal.entries(
        &EntryFilter::default(),
        Pagination {
            offset: 2,
            limit: Some(2),
        },
    );
    assert_eq!(page.total_count, 5);
    assert_eq!(page.returned_count, 2);
    assert!(page.has_more);
}
