//! End-to-end stamping tests.

use docstamp::model::{
    Block, Comment, CommentId, Document, InlineContent, Note, NoteId, Paragraph, Run, RunContent, RunStyle,
    SectionBreakType, SectionProperties, Table, TableCell, TableRow,
};
use docstamp::{DocStamper, Error, StampConfig, TableData, Value};

fn commented(id: u64, runs: Vec<Run>) -> Paragraph {
    let mut para = Paragraph::new();
    para.push(InlineContent::CommentRangeStart(CommentId(id)));
    for run in runs {
        para.add_run(run);
    }
    para.push(InlineContent::CommentRangeEnd(CommentId(id)));
    para.push(InlineContent::CommentReference(CommentId(id)));
    para
}

fn customer() -> Value {
    Value::map([
        ("name", Value::from("Ada")),
        ("vip", Value::from(true)),
        ("note", Value::Null),
        (
            "orders",
            Value::list([
                Value::map([("id", Value::from(1)), ("total", Value::from(9.5))]),
                Value::map([("id", Value::from(2)), ("total", Value::from(12.0))]),
            ]),
        ),
    ])
}

#[test]
fn test_unaffected_paragraph_is_unchanged() {
    let plain = Paragraph::with_runs([Run::bold("Terms"), Run::new(" and "), Run::italic("conditions")]);
    let mut doc = Document::with_body([
        Block::from(Paragraph::with_text("Dear ${name},")),
        Block::from(plain.clone()),
    ]);

    let stamper = DocStamper::new().with_config(StampConfig::default().without_cleanup());
    stamper.stamp(&mut doc, &customer()).unwrap();

    let after = doc.body[1].as_paragraph().unwrap();
    assert_eq!(after.content, plain.content);
    assert_eq!(after.style, plain.style);
}

#[test]
fn test_default_cleanup_normalizes_untouched_runs() {
    let german = RunStyle {
        lang: Some("de".into()),
        ..Default::default()
    };
    let plain = Paragraph::with_runs([
        Run::styled("Allgemeine ", german.clone()),
        Run::styled("Bedingungen", german),
    ]);
    let build = || Document::with_body([Block::from(plain.clone())]);

    let mut doc = build();
    let report = DocStamper::new().stamp(&mut doc, &customer()).unwrap();
    let after = doc.body[0].as_paragraph().unwrap();
    assert_eq!(after.text(), "Allgemeine Bedingungen");
    assert_eq!(after.runs().count(), 1);
    assert!(after.runs().all(|r| r.style.lang.is_none()));
    assert_eq!(report.runs_merged, 1);

    let mut doc = build();
    let stamper = DocStamper::new().with_config(StampConfig::default().without_cleanup());
    stamper.stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.body[0].as_paragraph().unwrap().content, plain.content);
}

#[test]
fn test_split_keeps_formatting() {
    let mut doc = Document::with_body([Block::from(Paragraph::with_runs([
        Run::new("Hello "),
        Run::bold("dear ${name} friend"),
        Run::new("!"),
    ]))]);

    DocStamper::new().stamp(&mut doc, &customer()).unwrap();

    let para = doc.body[0].as_paragraph().unwrap();
    assert_eq!(para.text(), "Hello dear Ada friend!");
    let bold: Vec<String> = para.runs().filter(|r| r.style.bold).map(|r| r.text()).collect();
    assert_eq!(bold, vec!["dear ", "Ada", " friend"]);
}

#[test]
fn test_placeholder_across_runs() {
    let mut doc = Document::with_body([Block::from(Paragraph::with_runs([
        Run::new("Total: $"),
        Run::bold("{orders[1].total"),
        Run::new("} EUR"),
    ]))]);

    DocStamper::new().stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Total: 12.0 EUR");
}

#[test]
fn test_display_paragraph_if() {
    let mut doc = Document::with_body([
        Block::from(Paragraph::with_text("Hello ${name}")),
        Block::from(commented(1, vec![Run::new("VIP lounge access")])),
        Block::from(commented(2, vec![Run::new("Standard seating")])),
        Block::from(commented(3, vec![Run::new("Note: ${note}")])),
    ]);
    doc.add_comment(Comment::new(1, "displayParagraphIf(vip)"));
    doc.add_comment(Comment::new(2, "displayParagraphIf(!vip)"));
    doc.add_comment(Comment::new(3, "displayParagraphIfPresent(note)"));

    let report = DocStamper::new().stamp(&mut doc, &customer()).unwrap();

    assert_eq!(doc.plain_text(), "Hello Ada\nVIP lounge access");
    assert_eq!(report.paragraphs_removed, 2);
    assert_eq!(report.directives_applied, 3);
    assert!(doc.comments.is_empty());
    assert!(doc
        .paragraphs()
        .all(|p| p.content.iter().all(|c| c.comment_id().is_none())));
}

#[test]
fn test_display_table_row_and_table() {
    let row_cell = commented(1, vec![Run::new("Discount")]);
    let table = Table::with_rows([
        TableRow::from_strings(["Item", "Price"]),
        TableRow::new(vec![TableCell::paragraph(row_cell), TableCell::from_text("-5")]),
    ]);
    let hidden = Table::with_rows([TableRow::new(vec![TableCell::paragraph(commented(
        2,
        vec![Run::new("Internal")],
    ))])]);

    let mut doc = Document::with_body([Block::from(table), Block::from(hidden)]);
    doc.add_comment(Comment::new(1, "displayTableRowIf(!vip)"));
    doc.add_comment(Comment::new(2, "displayTableIf(false)"));

    let report = DocStamper::new().stamp(&mut doc, &customer()).unwrap();

    assert_eq!(doc.body.len(), 1);
    assert_eq!(doc.body[0].as_table().unwrap().row_count(), 1);
    assert_eq!(report.rows_removed, 1);
    assert_eq!(report.tables_removed, 1);
}

#[test]
fn test_row_directive_outside_table_fails() {
    let mut doc = Document::with_body([Block::from(commented(1, vec![Run::new("Grand total")]))]);
    doc.add_comment(Comment::new(1, "displayTableRowIf(true)"));
    let original = doc.clone();

    let err = DocStamper::new().stamp(&mut doc, &customer()).unwrap_err();
    match &err {
        Error::StructuralPrecondition { paragraph, .. } => assert_eq!(paragraph, "Grand total"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("Grand total"));
    assert_eq!(doc, original);
}

#[test]
fn test_fail_fast_and_leave_empty() {
    let build = || Document::with_body([Block::from(Paragraph::with_text("Hi ${missing.name}!"))]);

    let mut doc = build();
    let err = DocStamper::new().stamp(&mut doc, &customer()).unwrap_err();
    assert!(matches!(err, Error::UnresolvedExpression { ref placeholder, .. } if placeholder == "${missing.name}"));
    assert_eq!(doc.plain_text(), "Hi ${missing.name}!");

    let mut doc = build();
    let stamper = DocStamper::new().with_config(StampConfig::default().leave_empty_on_error(true));
    let report = stamper.stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Hi !");
    assert_eq!(report.expressions_recovered, 1);
}

#[test]
fn test_keep_placeholder_when_not_failing() {
    let mut doc = Document::with_body([Block::from(Paragraph::with_text("Hi ${missing}!"))]);
    let stamper = DocStamper::new().with_config(StampConfig::default().with_fail_on_unresolved(false));
    stamper.stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Hi ${missing}!");
}

#[test]
fn test_directive_argument_failure_follows_policy() {
    let build = || {
        let mut doc = Document::with_body([
            Block::from(commented(1, vec![Run::new("x")])),
            Block::from(Paragraph::with_text("Hi ${name}")),
        ]);
        doc.add_comment(Comment::new(1, "displayParagraphIf(missing.flag)"));
        doc
    };

    let err = DocStamper::new().stamp(&mut build(), &customer()).unwrap_err();
    assert!(matches!(err, Error::UnresolvedExpression { ref paragraph, .. } if paragraph == "x"));

    for config in [
        StampConfig::default().with_fail_on_unresolved(false),
        StampConfig::default().leave_empty_on_error(true),
    ] {
        let mut doc = build();
        let report = DocStamper::new().with_config(config).stamp(&mut doc, &customer()).unwrap();
        assert_eq!(doc.plain_text(), "x\nHi Ada");
        assert_eq!(report.directives_skipped, 1);
        assert_eq!(report.directives_applied, 0);
        // The comment stays for the author to fix
        assert_eq!(doc.comments.len(), 1);
    }
}

#[test]
fn test_repeat_after_display_removed_part_of_range() {
    let mut first = Paragraph::new();
    first.push(InlineContent::CommentRangeStart(CommentId(1)));
    first.push(InlineContent::CommentRangeStart(CommentId(2)));
    first.add_text("Heading ${n}");
    first.push(InlineContent::CommentRangeEnd(CommentId(1)));

    let mut second = Paragraph::with_text("more ${n}");
    second.push(InlineContent::CommentRangeEnd(CommentId(2)));

    let mut doc = Document::with_body([
        Block::from(first),
        Block::from(second),
        Block::from(Paragraph::with_text("End")),
    ]);
    doc.add_comment(Comment::new(1, "displayParagraphIf(false)"));
    doc.add_comment(Comment::new(2, "repeatParagraph(items)"));

    let context = Value::map([(
        "items",
        Value::list([Value::map([("n", 1)]), Value::map([("n", 2)])]),
    )]);
    let report = DocStamper::new().stamp(&mut doc, &context).unwrap();

    assert_eq!(doc.plain_text(), "more 1\nmore 2\nEnd");
    assert_eq!(report.paragraphs_removed, 1);
    assert_eq!(report.blocks_repeated, 2);
    assert!(doc.comments.is_empty());
}

#[test]
fn test_repeat_paragraph() {
    let mut doc = Document::with_body([
        Block::from(Paragraph::with_text("Orders for ${name}:")),
        Block::from(commented(1, vec![Run::new("#${id}: ${total}")])),
        Block::from(Paragraph::with_text("Thanks")),
    ]);
    doc.add_comment(Comment::new(1, "repeatParagraph(orders)"));

    let report = DocStamper::new().stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Orders for Ada:\n#1: 9.5\n#2: 12.0\nThanks");
    assert_eq!(report.blocks_repeated, 2);
    assert!(doc.comments.is_empty());
}

#[test]
fn test_repeat_restores_section_breaks() {
    let intro = Paragraph::with_text("Intro")
        .section_break(SectionProperties::new(SectionBreakType::Continuous).with_columns(2));

    let mut first = Paragraph::new();
    first.push(InlineContent::CommentRangeStart(CommentId(1)));
    first.add_text("Chapter ${#this}");
    let first = first.section_break(SectionProperties::new(SectionBreakType::NextPage));

    let mut second = Paragraph::with_text("Body of ${#this}");
    second.push(InlineContent::CommentRangeEnd(CommentId(1)));

    let mut doc = Document::with_body([
        Block::from(intro),
        Block::from(first),
        Block::from(second),
        Block::from(Paragraph::with_text("End")),
    ]);
    doc.add_comment(Comment::new(1, "repeatParagraph(chapters)"));

    let context = Value::map([("chapters", Value::list(["a", "b", "c"]))]);
    DocStamper::new().stamp(&mut doc, &context).unwrap();

    assert_eq!(doc.body.len(), 8);
    let breaks: Vec<Option<u8>> = doc
        .paragraphs()
        .map(|p| p.style.section_break.as_ref().map(|s| s.columns))
        .collect();
    assert_eq!(
        breaks,
        vec![Some(2), Some(1), Some(2), Some(1), Some(2), Some(1), None, None]
    );
    assert_eq!(
        doc.plain_text(),
        "Intro\nChapter a\nBody of a\nChapter b\nBody of b\nChapter c\nBody of c\nEnd"
    );
}

#[test]
fn test_nested_comment_in_repeat_is_not_interpreted() {
    let mut start = Paragraph::new();
    start.push(InlineContent::CommentRangeStart(CommentId(1)));
    start.add_text("Item ${id}");
    let mut inner = commented(2, vec![Run::new("Total ${total}")]);
    inner.push(InlineContent::CommentRangeEnd(CommentId(1)));

    let mut doc = Document::with_body([Block::from(start), Block::from(inner)]);
    doc.add_comment(Comment::new(1, "repeatParagraph(orders)"));
    // Would fail if evaluated against the root context
    doc.add_comment(Comment::new(2, "displayParagraphIf(total > 10)"));

    DocStamper::new().stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Item 1\nTotal 9.5\nItem 2\nTotal 12.0");
    assert!(doc.comments.is_empty());
}

#[test]
fn test_replace_word_and_resolve_table() {
    let mut greeting = Paragraph::with_text("Dear ");
    greeting.push(InlineContent::CommentRangeStart(CommentId(1)));
    greeting.add_run(Run::bold("customer"));
    greeting.push(InlineContent::CommentRangeEnd(CommentId(1)));

    let table = Table::with_rows([
        TableRow::new(vec![TableCell::paragraph(commented(2, vec![Run::new("H1")])), TableCell::from_text("H2")]),
        TableRow::from_strings(["v1", "v2"]),
    ]);

    let mut doc = Document::with_body([Block::from(greeting), Block::from(table)]);
    doc.add_comment(Comment::new(1, "replaceWordWith(name)"));
    doc.add_comment(Comment::new(2, "resolveTable(prices)"));

    let mut context = customer();
    if let Value::Map(map) = &mut context {
        map.insert(
            "prices".into(),
            Value::Table(TableData::new(["Plan", "Price"], [vec!["Basic", "10"], vec!["Pro", "20"]])),
        );
    }

    let report = DocStamper::new().stamp(&mut doc, &context).unwrap();
    assert_eq!(doc.plain_text(), "Dear Ada\nPlan\tPrice\nBasic\t10\nPro\t20");
    assert_eq!(report.words_replaced, 1);
    assert_eq!(report.tables_filled, 1);
}

#[test]
fn test_orphan_notes_swept() {
    let mut para = Paragraph::with_text("See notes ${name}");
    for id in [1, 3] {
        para.add_run(Run {
            content: vec![RunContent::FootnoteReference(NoteId(id))],
            style: RunStyle::default(),
        });
    }
    let mut doc = Document::with_body([Block::from(para)]);
    doc.footnotes = vec![Note::new(1, "one"), Note::new(2, "two"), Note::new(3, "three")];

    let report = DocStamper::new().stamp(&mut doc, &customer()).unwrap();
    let ids: Vec<i64> = doc.footnotes.iter().map(|n| n.id.0).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(report.notes_removed, 1);
}

#[test]
fn test_lenient_unknown_directive_keeps_comment() {
    let mut doc = Document::with_body([Block::from(commented(1, vec![Run::new("Looks good ${name}")]))]);
    doc.add_comment(Comment::new(1, "Please double check this paragraph"));

    let err = DocStamper::new().stamp(&mut doc.clone(), &customer()).unwrap_err();
    assert!(matches!(err, Error::MalformedDirective { .. }));

    let stamper = DocStamper::new().with_config(StampConfig::default().lenient());
    let report = stamper.stamp(&mut doc, &customer()).unwrap();
    assert_eq!(report.directives_skipped, 1);
    assert_eq!(doc.comments.len(), 1);
    assert_eq!(doc.plain_text(), "Looks good Ada");
}

#[test]
fn test_custom_delimiters() {
    let mut doc = Document::with_body([Block::from(Paragraph::with_text("Hi #{name}, ${name}"))]);
    let stamper = DocStamper::new().with_config(StampConfig::default().with_delimiters("#{", "}"));
    stamper.stamp(&mut doc, &customer()).unwrap();
    assert_eq!(doc.plain_text(), "Hi Ada, ${name}");
}

#[test]
fn test_empty_delimiter_rejected() {
    let mut doc = Document::with_body([Block::from(Paragraph::with_text("x"))]);
    let stamper = DocStamper::new().with_config(StampConfig::default().with_delimiters("", "}"));
    assert!(matches!(
        stamper.stamp(&mut doc, &Value::Null),
        Err(Error::InvalidDelimiter(_))
    ));
}

#[test]
fn test_stamp_batch() {
    let jobs: Vec<(Document, Value)> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            (
                Document::with_body([Block::from(Paragraph::with_text("Hello ${name}"))]),
                Value::map([("name", *name)]),
            )
        })
        .chain(std::iter::once((
            Document::with_body([Block::from(Paragraph::with_text("Hello ${missing}"))]),
            Value::map([("name", "d")]),
        )))
        .collect();

    let results = DocStamper::new().stamp_batch(jobs);
    assert_eq!(results.len(), 4);
    let texts: Vec<String> = results[..3]
        .iter()
        .map(|r| r.as_ref().unwrap().0.plain_text())
        .collect();
    assert_eq!(texts, vec!["Hello a", "Hello b", "Hello c"]);
    assert!(results[3].is_err());
}

#[test]
fn test_stamp_json() {
    let doc = Document::with_body([Block::from(Paragraph::with_text("${greeting}, ${names[0]}"))]);
    let json = docstamp::model::to_json(&doc, docstamp::model::JsonFormat::Compact).unwrap();

    let stamped = docstamp::stamp_json(
        &json,
        &serde_json::json!({"greeting": "Hello", "names": ["Ada", "Alan"]}),
    )
    .unwrap();
    assert_eq!(stamped.plain_text(), "Hello, Ada");
}
