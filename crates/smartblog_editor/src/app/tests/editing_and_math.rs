//! Command dispatch, toolbar state and math decorator tests.

use super::*;
use smartblog_core::document::{FormatFlag, HeadingTag};
use smartblog_core::{BlockType, MathNode, MathView, MathViewState, RenderError, Typesetter};

struct Katex;

impl Typesetter for Katex {
    fn render(&self, source: &str, display_mode: bool) -> Result<String, RenderError> {
        if source.contains("\\bad") {
            return Err(RenderError::new("undefined control sequence"));
        }
        Ok(format!("<katex display={}>{}</katex>", display_mode, source))
    }
}

fn stored_latex(app: &EditorApp, key: smartblog_core::NodeKey) -> String {
    app.document()
        .node(key)
        .and_then(|node| node.extension::<MathNode>())
        .map(|node| node.latex().to_string())
        .expect("math node")
}

#[test]
fn commands_without_an_open_post_are_ignored() {
    let mut harness = make_app();
    assert!(!harness.type_text("orphan", Instant::now()));
    assert!(!harness.app.session().is_dirty());
    assert_eq!(harness.app.document().text_content(), "");
}

#[test]
fn toolbar_state_follows_pending_format_and_block_type() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let now = Instant::now();

    assert!(!harness.app.dispatch(Command::FormatText(FormatFlag::Bold), now));
    assert!(harness.app.format_state().is_bold);
    assert!(!harness.app.session().is_dirty());

    harness.app.dispatch(Command::FormatText(FormatFlag::Bold), now);
    assert!(!harness.app.format_state().is_bold);

    harness.type_text("Heading", now);
    let heading = BlockType::Heading(HeadingTag::H1);
    assert!(harness.app.dispatch(Command::SetBlockType(heading), now));
    assert_eq!(harness.app.format_state().active_block_type, heading);
    assert!(harness.app.session().serialized_content().contains("\"heading\""));

    assert!(harness.app.dispatch(Command::SetBlockType(heading), now));
    assert_eq!(
        harness.app.format_state().active_block_type,
        BlockType::Paragraph
    );
}

#[test]
fn empty_math_node_starts_editing_and_commit_displays_it() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let start = Instant::now();
    assert!(harness.app.dispatch(
        Command::InsertMath {
            latex: String::new(),
            inline: true,
        },
        start,
    ));
    let keys = harness.app.math_keys();
    assert_eq!(keys.len(), 1);
    let key = keys[0];
    assert_eq!(
        harness.app.math_editor(key).map(MathEditor::state),
        Some(MathViewState::Editing)
    );

    harness.app.math_input(key, "y^2");
    harness.app.math_cancel(key);
    assert_eq!(stored_latex(&harness.app, key), "");
    assert_eq!(
        harness.app.math_editor(key).map(MathEditor::state),
        Some(MathViewState::Editing)
    );

    let commit_at = start + Duration::from_millis(100);
    harness.app.math_input(key, "x^2");
    assert!(harness.app.math_commit(key, commit_at));
    assert_eq!(stored_latex(&harness.app, key), "x^2");
    assert_eq!(
        harness.app.math_view(key, &Katex),
        Some(MathView::Rendered {
            markup: "<katex display=false>x^2</katex>".to_string(),
            display_mode: false,
        })
    );

    harness.app.tick_at(commit_at + AUTOSAVE_DELAY);
    let (_, content) = harness.expect_save();
    assert!(content.contains("\"latex\":\"x^2\""));
}

#[test]
fn cancelling_an_edit_keeps_the_stored_formula() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let now = Instant::now();
    harness.app.dispatch(
        Command::InsertMath {
            latex: "a+b".to_string(),
            inline: false,
        },
        now,
    );
    let key = harness.app.math_keys()[0];
    assert_eq!(
        harness.app.math_editor(key).map(MathEditor::state),
        Some(MathViewState::Display)
    );
    let dirty_content = harness.app.session().serialized_content().to_string();

    harness.app.math_click(key);
    harness.app.math_input(key, "a-b");
    harness.app.math_cancel(key);
    assert_eq!(stored_latex(&harness.app, key), "a+b");
    assert_eq!(harness.app.session().serialized_content(), dirty_content);
    assert!(!harness.app.math_commit(key, now));
}

#[test]
fn typesetting_failure_falls_back_to_source() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    harness.app.dispatch(
        Command::InsertMath {
            latex: "\\bad{x}".to_string(),
            inline: true,
        },
        Instant::now(),
    );
    let key = harness.app.math_keys()[0];
    assert_eq!(
        harness.app.math_view(key, &Katex),
        Some(MathView::PlainText {
            source: "\\bad{x}".to_string(),
        })
    );
}

#[test]
fn loading_a_post_attaches_math_editors() {
    let mut harness = make_app();
    let content = r#"{"root":{"type":"root","version":1,"children":[
        {"type":"paragraph","version":1,"children":[
            {"type":"text","version":1,"format":0,"text":"Euler: "},
            {"type":"math","version":1,"inline":true,"latex":"e^{i\\pi}+1=0"}]}]}}"#;
    harness.open(test_post("p1", content));

    let keys = harness.app.math_keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(
        harness.app.math_editor(keys[0]).map(MathEditor::state),
        Some(MathViewState::Display)
    );

    harness.app.close_post();
    assert!(harness.app.math_keys().is_empty());
}

#[test]
fn table_insertion_marks_post_dirty() {
    let mut harness = make_app();
    harness.open(test_post("p1", "{}"));
    let now = Instant::now();
    assert!(!harness
        .app
        .dispatch(Command::InsertTable { rows: 0, columns: 3 }, now));
    assert!(!harness.app.session().is_dirty());

    assert!(harness
        .app
        .dispatch(Command::InsertTable { rows: 3, columns: 3 }, now));
    assert!(harness.app.session().is_dirty());
    assert!(harness.app.session().serialized_content().contains("\"tablecell\""));
}
