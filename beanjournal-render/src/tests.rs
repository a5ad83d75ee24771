use std::path::Path;
use std::str::FromStr;

use indoc::indoc;
use rust_decimal::Decimal;

use beanjournal_core::{
    Account, Amount, Balance, Booking, Close, Commodity, CostSpec, Date, Directive, Flag, Meta,
    MetaValue, Note, Open, Pad, Posting, PriceSpec, Transaction,
};

use super::{directive_lines, render_directive};

fn date(s: &str) -> Date {
    Date::from_str(s).unwrap()
}

fn account(s: &str) -> Account {
    Account::from_str(s).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn amount(num: &str, currency: &str) -> Amount {
    Amount::new(dec(num), currency)
}

/// Rendered text must parse back to the same directive, source aside.
fn assert_round_trips(directive: &Directive) {
    let text = render_directive(directive).unwrap();
    let parsed = beanjournal_parser::parse(&format!("{}\n", text), Path::new("round-trip"))
        .unwrap_or_else(|e| panic!("rendered text failed to parse: {}\n{}", e, text));
    assert!(parsed.errors.is_empty(), "errors: {:?}", parsed.errors);
    assert_eq!(parsed.directives.len(), 1, "text: {}", text);
    let mut reparsed = parsed.directives.into_iter().next().unwrap();
    reparsed.set_source(None);
    assert_eq!(&reparsed, directive);
}

#[test]
fn renders_simple_transaction() {
    let directive = Directive::Transaction(
        Transaction::builder()
            .date(date("2024-01-01"))
            .payee(Some("Corner Store".into()))
            .narration("Coffee".into())
            .postings(vec![
                Posting::builder()
                    .account(account("Assets:Cash"))
                    .units(Some(amount("-3.50", "USD")))
                    .build(),
                Posting::builder()
                    .account(account("Expenses:Coffee"))
                    .units(Some(amount("3.50", "USD")))
                    .build(),
            ])
            .build(),
    );
    assert_eq!(
        render_directive(&directive).unwrap(),
        indoc! {r#"
            2024-01-01 * "Corner Store" "Coffee"
              Assets:Cash  -3.50 USD
              Expenses:Coffee  3.50 USD"#}
    );
    assert_round_trips(&directive);
}

#[test]
fn transaction_header_string_rules() {
    let mut txn = Transaction::builder()
        .date(date("2024-01-01"))
        .narration("only narration".into())
        .build();
    let header = |t: &Transaction| {
        render_directive(&Directive::Transaction(t.clone()))
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string()
    };
    assert_eq!(header(&txn), "2024-01-01 * \"only narration\"");

    txn.payee = Some("only payee".into());
    txn.narration = String::new();
    assert_eq!(header(&txn), "2024-01-01 * \"only payee\" \"\"");

    txn.payee = None;
    assert_eq!(header(&txn), "2024-01-01 * \"\"");
}

#[test]
fn transaction_tags_links_and_metadata() {
    let mut meta = Meta::new();
    meta.insert("invoice", MetaValue::Text("INV-77".into()));
    let directive = Directive::Transaction(
        Transaction::builder()
            .date(date("2024-03-05"))
            .flag(Flag::Warning)
            .narration("Rent".into())
            .tags(["#housing".to_string(), "monthly".to_string()].into())
            .links(["mar-2024".to_string()].into())
            .meta(meta)
            .postings(vec![Posting::builder()
                .account(account("Expenses:Rent"))
                .units(Some(amount("1200", "USD")))
                .build()])
            .build(),
    );
    // Tags are normalized to exactly one leading '#'.
    assert_eq!(
        render_directive(&directive).unwrap(),
        indoc! {r#"
            2024-03-05 ! "Rent" #housing #monthly ^mar-2024
              invoice: "INV-77"
              Expenses:Rent  1200 USD"#}
    );
}

#[test]
fn renders_posting_details() {
    let mut posting_meta = Meta::new();
    posting_meta.insert("lot", MetaValue::Text("a".into()));
    let directive = Directive::Transaction(
        Transaction::builder()
            .date(date("2020-10-01"))
            .narration("Sell".into())
            .postings(vec![
                Posting::builder()
                    .account(account("Assets:Trading"))
                    .units(Some(amount("-1", "HOOL")))
                    .cost(Some(
                        CostSpec::builder()
                            .number(Some(dec("500.00")))
                            .currency(Some("USD".into()))
                            .date(Some(date("2020-01-01")))
                            .label(Some("lot-a".into()))
                            .build(),
                    ))
                    .price(Some(PriceSpec {
                        amount: amount("585.00", "USD"),
                        total: false,
                    }))
                    .comment(Some("realized gain".into()))
                    .meta(posting_meta)
                    .build(),
                Posting::builder()
                    .account(account("Assets:Cash"))
                    .flag(Some(Flag::Warning))
                    .units(Some(amount("585.00", "USD")))
                    .price(Some(PriceSpec {
                        amount: amount("585.00", "USD"),
                        total: true,
                    }))
                    .build(),
                Posting::builder()
                    .account(account("Income:Trading:Gains"))
                    .build(),
            ])
            .build(),
    );
    assert_eq!(
        render_directive(&directive).unwrap(),
        indoc! {r#"
            2020-10-01 * "Sell"
              Assets:Trading  -1 HOOL {500.00 USD, 2020-01-01, "lot-a"} @ 585.00 USD ; realized gain
                lot: "a"
              ! Assets:Cash  585.00 USD @@ 585.00 USD
              Income:Trading:Gains"#}
    );
    assert_round_trips(&directive);
}

#[test]
fn renders_total_cost_spec() {
    let directive = Directive::Transaction(
        Transaction::builder()
            .date(date("2020-10-01"))
            .narration("Buy".into())
            .postings(vec![Posting::builder()
                .account(account("Assets:Trading"))
                .units(Some(amount("10", "HOOL")))
                .cost(Some(
                    CostSpec::builder()
                        .number(Some(dec("5000.00")))
                        .currency(Some("USD".into()))
                        .total(true)
                        .build(),
                ))
                .build()])
            .build(),
    );
    let text = render_directive(&directive).unwrap();
    assert!(text.contains("{{5000.00 USD}}"), "text: {}", text);
    assert_round_trips(&directive);
}

#[test]
fn renders_balance() {
    let plain = Directive::Balance(
        Balance::builder()
            .date(date("2024-02-01"))
            .account(account("Assets:Cash"))
            .amount(amount("100.00", "USD"))
            .build(),
    );
    assert_eq!(
        render_directive(&plain).unwrap(),
        "2024-02-01 balance Assets:Cash 100.00 USD"
    );
    assert_round_trips(&plain);

    let with_tolerance = Directive::Balance(
        Balance::builder()
            .date(date("2024-02-01"))
            .account(account("Assets:Cash"))
            .amount(amount("100.00", "USD"))
            .tolerance(Some(dec("0.05")))
            .build(),
    );
    assert_eq!(
        render_directive(&with_tolerance).unwrap(),
        "2024-02-01 balance Assets:Cash 100.00 USD ~ 0.05 USD"
    );
    assert_round_trips(&with_tolerance);
}

#[test]
fn renders_note_and_pad() {
    let note = Directive::Note(
        Note::builder()
            .date(date("2013-11-03"))
            .account(account("Liabilities:CreditCard"))
            .comment("Called about fraud.".into())
            .build(),
    );
    assert_eq!(
        render_directive(&note).unwrap(),
        "2013-11-03 note Liabilities:CreditCard \"Called about fraud.\""
    );
    assert_round_trips(&note);

    let pad = Directive::Pad(
        Pad::builder()
            .date(date("2014-06-01"))
            .account(account("Assets:Checking"))
            .source_account(account("Equity:Opening-Balances"))
            .build(),
    );
    assert_eq!(
        render_directive(&pad).unwrap(),
        "2014-06-01 pad Assets:Checking Equity:Opening-Balances"
    );
    assert_round_trips(&pad);
}

#[test]
fn renders_open_and_close() {
    let bare = Directive::Open(
        Open::builder()
            .date(date("2012-01-01"))
            .account(account("Assets:Checking"))
            .build(),
    );
    assert_eq!(
        render_directive(&bare).unwrap(),
        "2012-01-01 open Assets:Checking"
    );
    assert_round_trips(&bare);

    let full = Directive::Open(
        Open::builder()
            .date(date("2012-01-01"))
            .account(account("Assets:Checking"))
            .currencies(vec!["USD".into(), "EUR".into()])
            .booking(Some(Booking::Strict))
            .build(),
    );
    assert_eq!(
        render_directive(&full).unwrap(),
        "2012-01-01 open Assets:Checking USD,EUR \"STRICT\""
    );
    assert_round_trips(&full);

    let close = Directive::Close(
        Close::builder()
            .date(date("2016-11-28"))
            .account(account("Liabilities:CreditCard"))
            .build(),
    );
    assert_eq!(
        render_directive(&close).unwrap(),
        "2016-11-28 close Liabilities:CreditCard"
    );
    assert_round_trips(&close);
}

#[test]
fn renders_commodity_with_metadata() {
    let mut meta = Meta::new();
    meta.insert("name", MetaValue::Text("Hooli Inc.".into()));
    meta.insert("price", MetaValue::Text("USD:google/NASDAQ:HOOL".into()));
    let directive = Directive::Commodity(
        Commodity::builder()
            .date(date("2012-01-01"))
            .name("HOOL".to_string())
            .meta(meta)
            .build(),
    );
    assert_eq!(
        render_directive(&directive).unwrap(),
        indoc! {r#"
            2012-01-01 commodity HOOL
              name: "Hooli Inc."
              price: "USD:google/NASDAQ:HOOL""#}
    );
    assert_round_trips(&directive);
}

#[test]
fn directive_lines_splits_rendered_text() {
    let directive = Directive::Transaction(
        Transaction::builder()
            .date(date("2024-01-01"))
            .narration("Coffee".into())
            .postings(vec![Posting::builder()
                .account(account("Assets:Cash"))
                .units(Some(amount("-3.50", "USD")))
                .build()])
            .build(),
    );
    let lines = directive_lines(&directive).unwrap();
    assert_eq!(
        lines,
        vec![
            "2024-01-01 * \"Coffee\"".to_string(),
            "  Assets:Cash  -3.50 USD".to_string(),
        ]
    );
}
