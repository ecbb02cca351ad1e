//! Commands that mutate the document at the active selection, and the
//! toolbar state derived from that selection.
//!
//! Every command runs as one [`Document::update`] batch. Commands that
//! cannot apply (no selection, bad dimensions, invalid placement) are
//! absorbed by [`execute`] as no-ops.

use crate::constants::{MAX_TABLE_COLUMNS, MAX_TABLE_ROWS};
use crate::document::{
    Document, DocumentChange, FormatFlag, HeadingTag, ListKind, NodeKey, NodeKind, NodeRef,
    TextRun, Transaction,
};
use crate::error::{EditorError, Result};
use crate::math::MathNode;
use crate::selection::{Point, Selection};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Block-level formatting the toolbar can apply and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    #[default]
    Paragraph,
    Heading(HeadingTag),
    List(ListKind),
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::Heading(tag) => tag.as_str(),
            BlockType::List(kind) => kind.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "paragraph" {
            return Some(BlockType::Paragraph);
        }
        HeadingTag::parse(raw)
            .map(BlockType::Heading)
            .or_else(|| ListKind::parse(raw).map(BlockType::List))
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toolbar projection of the active selection. Never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_underline: bool,
    pub active_block_type: BlockType,
}

impl FormatState {
    /// Derive the state from the document's selection, or `None` when
    /// nothing is selected.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let selection = doc.selection()?;
        Some(Self {
            is_bold: selection.has_format(FormatFlag::Bold),
            is_italic: selection.has_format(FormatFlag::Italic),
            is_underline: selection.has_format(FormatFlag::Underline),
            active_block_type: resolve_block_type(doc, selection.anchor.key),
        })
    }
}

/// Block type at `anchor`.
///
/// Resolution order: a heading as the nearest block gives its level; a list
/// there gives its kind; otherwise the nearest list found by walking up from
/// the anchor's parent; otherwise paragraph. Anchors outside any block use
/// their top-level element.
pub fn resolve_block_type(doc: &Document, anchor: NodeKey) -> BlockType {
    let element = if anchor == NodeKey::ROOT {
        anchor
    } else {
        doc.nearest_block_key(anchor).unwrap_or_else(|| doc.top_level_key(anchor))
    };
    match doc.node(element).map(|node| node.kind()) {
        Some(NodeKind::Heading(tag)) => return BlockType::Heading(*tag),
        Some(NodeKind::List(kind)) => return BlockType::List(*kind),
        _ => {}
    }
    let Some(parent) = doc.parent_key(anchor) else {
        return BlockType::Paragraph;
    };
    let is_list = |kind: &NodeKind| matches!(kind, NodeKind::List(_));
    let nearest_list = if doc.node(parent).is_some_and(|node| is_list(node.kind())) {
        Some(parent)
    } else {
        doc.find_ancestor(parent, is_list)
    };
    match nearest_list.and_then(|key| doc.node(key)).map(|node| node.kind()) {
        Some(NodeKind::List(kind)) => BlockType::List(*kind),
        _ => BlockType::Paragraph,
    }
}

/// Editor commands and selection-change events.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Toggle an inline format on the selection.
    FormatText(FormatFlag),
    /// Apply a block type; applying the active type reverts to paragraph.
    SetBlockType(BlockType),
    /// Insert a node at the selection, replacing any selected text.
    InsertNode(NodeKind),
    /// Type text at the caret, replacing any selected text.
    InsertText(String),
    InsertMath { latex: String, inline: bool },
    InsertTable { rows: usize, columns: usize },
    SetSelection(Selection),
    ClearSelection,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::FormatText(_) => "format_text",
            Command::SetBlockType(_) => "set_block_type",
            Command::InsertNode(_) => "insert_node",
            Command::InsertText(_) => "insert_text",
            Command::InsertMath { .. } => "insert_math",
            Command::InsertTable { .. } => "insert_table",
            Command::SetSelection(_) => "set_selection",
            Command::ClearSelection => "clear_selection",
        }
    }
}

/// Run `command`, absorbing any error as a no-op.
///
/// # Returns
/// The change notification of the committed batch, or `None` when the
/// command changed no nodes or could not apply.
pub fn execute(doc: &mut Document, command: Command) -> Option<DocumentChange> {
    let name = command.name();
    match apply(doc, command) {
        Ok(change) => change,
        Err(err) => {
            debug!(command = name, error = %err, "command ignored");
            None
        }
    }
}

/// Run `command`, reporting why it could not apply.
///
/// # Errors
/// Returns [`EditorError::Validation`] when there is no active selection or
/// the command's input is unusable. The document is unchanged on error.
pub fn apply(doc: &mut Document, command: Command) -> Result<Option<DocumentChange>> {
    match command {
        Command::SetSelection(selection) => {
            doc.set_selection(Some(selection))?;
            Ok(None)
        }
        Command::ClearSelection => {
            doc.set_selection(None)?;
            Ok(None)
        }
        Command::FormatText(flag) => format_text(doc, flag),
        Command::SetBlockType(block) => set_block_type(doc, block),
        Command::InsertNode(kind) => insert_node(doc, kind),
        Command::InsertText(text) => insert_text(doc, text),
        Command::InsertMath { latex, inline } => {
            insert_node(doc, NodeKind::extension(MathNode::new(latex, inline)))
        }
        Command::InsertTable { rows, columns } => insert_table(doc, rows, columns),
    }
}

fn active_selection(doc: &Document) -> Result<Selection> {
    doc.selection()
        .copied()
        .ok_or_else(|| EditorError::validation("no active selection"))
}

fn format_text(doc: &mut Document, flag: FormatFlag) -> Result<Option<DocumentChange>> {
    let selection = active_selection(doc)?;
    let enable = !selection.has_format(flag);
    let format = selection.format.with(flag, enable);
    if selection.is_collapsed() {
        // Pending format for the next typed text; no nodes change.
        return doc.update(|txn| {
            txn.set_selection(Some(Selection {
                format,
                ..selection
            }));
            Ok(())
        });
    }
    let (start, end) = doc.ordered_points(&selection);
    let backward = selection.anchor != start;
    doc.update(|txn| {
        let mut touched = Vec::new();
        for span in leaf_spans(txn, start, end) {
            if !span.text || span.from == span.to {
                continue;
            }
            let len = text_len(txn, span.key)?;
            if span.to < len {
                txn.split_text(span.key, span.to)?;
            }
            let target = if span.from > 0 {
                txn.split_text(span.key, span.from)?
            } else {
                span.key
            };
            let current = txn.kind(target)?.as_text().map(|run| run.format).unwrap_or_default();
            txn.set_format(target, current.with(flag, enable))?;
            touched.push((target, span.to - span.from));
        }
        let reselected = match (touched.first(), touched.last()) {
            (Some(&(first, _)), Some(&(last, last_len))) => {
                let start = Point::new(first, 0);
                let end = Point::new(last, last_len);
                let (anchor, focus) = if backward { (end, start) } else { (start, end) };
                Selection {
                    anchor,
                    focus,
                    format,
                }
            }
            _ => Selection {
                format,
                ..selection
            },
        };
        txn.set_selection(Some(reselected));
        Ok(())
    })
}

fn set_block_type(doc: &mut Document, requested: BlockType) -> Result<Option<DocumentChange>> {
    let selection = active_selection(doc)?;
    let active = resolve_block_type(doc, selection.anchor.key);
    let target = if active == requested {
        BlockType::Paragraph
    } else {
        requested
    };
    let (start, end) = doc.ordered_points(&selection);
    let blocks = selected_blocks(doc, start, end);
    if blocks.is_empty() {
        return Err(EditorError::validation("selection covers no blocks"));
    }
    debug!(from = %active, to = %target, blocks = blocks.len(), "changing block type");
    doc.update(|txn| match target {
        BlockType::Paragraph => retype_blocks(txn, &blocks, NodeKind::Paragraph),
        BlockType::Heading(tag) => retype_blocks(txn, &blocks, NodeKind::Heading(tag)),
        BlockType::List(kind) => wrap_in_lists(txn, &blocks, kind),
    })
}

fn insert_node(doc: &mut Document, kind: NodeKind) -> Result<Option<DocumentChange>> {
    if matches!(kind, NodeKind::Root) {
        return Err(EditorError::validation("root cannot be inserted"));
    }
    let selection = active_selection(doc)?;
    let (start, end) = doc.ordered_points(&selection);
    doc.update(|txn| {
        if !selection.is_collapsed() {
            delete_range(txn, start, end)?;
        }
        let inline = kind.is_inline();
        let node = txn.create(kind);
        let caret = if inline {
            place_inline(txn, start, node)?;
            caret_after(txn, node)
        } else {
            place_block(txn, start, node)?;
            caret_into(txn, node)
        };
        txn.set_selection(Some(Selection {
            anchor: caret,
            focus: caret,
            format: selection.format,
        }));
        Ok(())
    })
}

fn insert_text(doc: &mut Document, text: String) -> Result<Option<DocumentChange>> {
    if text.is_empty() {
        return Err(EditorError::validation("nothing to insert"));
    }
    let selection = active_selection(doc)?;
    let (start, end) = doc.ordered_points(&selection);
    let format = selection.format;
    doc.update(|txn| {
        if !selection.is_collapsed() {
            delete_range(txn, start, end)?;
        }
        let typed = text.chars().count();
        let existing = txn.kind(start.key)?.as_text().cloned();
        let caret = match existing {
            Some(run) if run.format == format => {
                let offset = start.offset.min(run.char_len());
                let mut updated = run.text.clone();
                updated.insert_str(run.byte_index(offset), &text);
                txn.set_text(start.key, updated)?;
                Point::new(start.key, offset + typed)
            }
            _ => {
                let node = txn.create(NodeKind::Text(TextRun::new(text, format)));
                place_inline(txn, start, node)?;
                Point::new(node, typed)
            }
        };
        txn.set_selection(Some(Selection {
            anchor: caret,
            focus: caret,
            format,
        }));
        Ok(())
    })
}

fn insert_table(doc: &mut Document, rows: usize, columns: usize) -> Result<Option<DocumentChange>> {
    if !(1..=MAX_TABLE_ROWS).contains(&rows) || !(1..=MAX_TABLE_COLUMNS).contains(&columns) {
        return Err(EditorError::validation(format!(
            "table of {}x{} is out of range",
            rows, columns
        )));
    }
    let selection = active_selection(doc)?;
    let (start, _) = doc.ordered_points(&selection);
    doc.update(|txn| {
        let table = txn.create(NodeKind::Table);
        let mut first_block = None;
        for row_index in 0..rows {
            let row = txn.create(NodeKind::TableRow);
            txn.append(table, row)?;
            for _ in 0..columns {
                let cell = txn.create(NodeKind::TableCell {
                    header: row_index == 0,
                });
                txn.append(row, cell)?;
                let paragraph = txn.create(NodeKind::Paragraph);
                txn.append(cell, paragraph)?;
                first_block.get_or_insert(paragraph);
            }
        }
        place_block(txn, start, table)?;
        if let Some(block) = first_block {
            txn.set_selection(Some(Selection {
                format: selection.format,
                ..Selection::caret(block, 0)
            }));
        }
        Ok(())
    })
}

/// A leaf touched by a range; `from..to` is the covered char range of text.
struct LeafSpan {
    key: NodeKey,
    from: usize,
    to: usize,
    text: bool,
}

fn text_len(txn: &Transaction, key: NodeKey) -> Result<usize> {
    Ok(txn.kind(key)?.as_text().map(TextRun::char_len).unwrap_or(0))
}

fn is_text(txn: &Transaction, key: NodeKey) -> bool {
    txn.kind(key).is_ok_and(|kind| kind.as_text().is_some())
}

fn point_path(txn: &Transaction, point: Point) -> Vec<usize> {
    let mut path = txn.path(point.key);
    if !is_text(txn, point.key) {
        path.push(point.offset);
    }
    path
}

fn leaf_spans(txn: &Transaction, start: Point, end: Point) -> Vec<LeafSpan> {
    let start_path = point_path(txn, start);
    let end_path = point_path(txn, end);
    let start_is_text = is_text(txn, start.key);
    let mut spans = Vec::new();
    for key in txn.descendants(NodeKey::ROOT) {
        let Ok(kind) = txn.kind(key) else {
            continue;
        };
        if !kind.is_leaf() {
            continue;
        }
        let run_len = kind.as_text().map(TextRun::char_len);
        if key == start.key || key == end.key {
            if let Some(len) = run_len {
                let from = if key == start.key { start.offset.min(len) } else { 0 };
                let to = if key == end.key { end.offset.min(len) } else { len };
                spans.push(LeafSpan {
                    key,
                    from,
                    to: to.max(from),
                    text: true,
                });
            }
            continue;
        }
        let path = txn.path(key);
        let after_start = if start_is_text {
            path > start_path
        } else {
            path >= start_path
        };
        if after_start && path < end_path {
            spans.push(LeafSpan {
                key,
                from: 0,
                to: run_len.unwrap_or(0),
                text: run_len.is_some(),
            });
        }
    }
    spans
}

/// Remove the selected content. Text is trimmed, wholly covered leaves are
/// removed, and elements are left in place.
fn delete_range(txn: &mut Transaction, start: Point, end: Point) -> Result<()> {
    for span in leaf_spans(txn, start, end) {
        if !span.text {
            txn.remove(span.key)?;
            continue;
        }
        if span.from == span.to {
            continue;
        }
        let Some(run) = txn.kind(span.key)?.as_text().cloned() else {
            continue;
        };
        let mut text = run.text.clone();
        text.replace_range(run.byte_index(span.from)..run.byte_index(span.to), "");
        txn.set_text(span.key, text)?;
    }
    Ok(())
}

/// Put an inline node at `point`, splitting text when the point is inside a run.
fn place_inline(txn: &mut Transaction, point: Point, node: NodeKey) -> Result<()> {
    let target = txn.kind(point.key)?;
    let text_len = target.as_text().map(TextRun::char_len);
    let is_block = target.is_block();
    let is_leaf = target.is_leaf();
    let wraps = matches!(target, NodeKind::Root | NodeKind::TableCell { .. });

    if let Some(len) = text_len {
        let offset = point.offset.min(len);
        if offset == 0 {
            return txn.insert_before(point.key, node);
        }
        if offset < len {
            txn.split_text(point.key, offset)?;
        }
        return txn.insert_after(point.key, node);
    }
    if is_leaf {
        return txn.insert_after(point.key, node);
    }
    let index = point.offset.min(txn.children(point.key).len());
    if is_block {
        return txn.insert_child(point.key, index, node);
    }
    if wraps {
        let paragraph = txn.create(NodeKind::Paragraph);
        txn.append(paragraph, node)?;
        return txn.insert_child(point.key, index, paragraph);
    }
    Err(EditorError::validation(format!(
        "inline content cannot be placed in {}",
        point.key
    )))
}

/// Put a block-level node after the top-level element holding `point`.
fn place_block(txn: &mut Transaction, point: Point, node: NodeKey) -> Result<()> {
    if point.key == NodeKey::ROOT {
        let index = point.offset.min(txn.children(NodeKey::ROOT).len());
        return txn.insert_child(NodeKey::ROOT, index, node);
    }
    let top = txn.top_level(point.key);
    txn.insert_after(top, node)
}

fn caret_after(txn: &Transaction, node: NodeKey) -> Point {
    if let Ok(Some(run)) = txn.kind(node).map(NodeKind::as_text) {
        return Point::new(node, run.char_len());
    }
    match (txn.parent(node), txn.index_in_parent(node)) {
        (Some(parent), Some(index)) => Point::new(parent, index + 1),
        _ => Point::new(NodeKey::ROOT, txn.children(NodeKey::ROOT).len()),
    }
}

fn caret_into(txn: &Transaction, node: NodeKey) -> Point {
    txn.descendants(node)
        .into_iter()
        .find(|key| txn.kind(*key).is_ok_and(NodeKind::is_block))
        .map(|block| Point::new(block, 0))
        .unwrap_or_else(|| caret_after(txn, node))
}

/// Innermost blocks between the two points, list items standing in for
/// blocks nested inside them.
fn selected_blocks(doc: &Document, start: Point, end: Point) -> Vec<NodeKey> {
    let innermost = |key: NodeKey| {
        doc.node(key).is_some_and(|node| {
            node.kind().is_block() && !node.children().any(|child| child.kind().is_block())
        })
    };
    let ordered: Vec<NodeKey> = doc
        .keys_in_order()
        .into_iter()
        .filter(|key| innermost(*key))
        .collect();
    let first = block_at(doc, start).and_then(|key| ordered.iter().position(|k| *k == key));
    let last = block_at(doc, end).and_then(|key| ordered.iter().position(|k| *k == key));
    let range = match (first, last) {
        (Some(first), Some(last)) if first <= last => &ordered[first..=last],
        (Some(index), _) | (None, Some(index)) => &ordered[index..=index],
        (None, None) => &[][..],
    };
    let mut seen = BTreeSet::new();
    range
        .iter()
        .map(|key| match doc.parent_key(*key) {
            Some(parent) if doc.node(parent).is_some_and(|n| matches!(n.kind(), NodeKind::ListItem)) => parent,
            _ => *key,
        })
        .filter(|key| seen.insert(*key))
        .collect()
}

fn block_at(doc: &Document, point: Point) -> Option<NodeKey> {
    fn innermost_block(node: NodeRef<'_>) -> Option<NodeKey> {
        let nested = node.children().find_map(innermost_block);
        if node.kind().is_block() {
            return nested.or(Some(node.key()));
        }
        nested
    }
    let base = doc.nearest_block_key(point.key).unwrap_or(point.key);
    let node = doc.node(base)?;
    let index = if base == point.key {
        point.offset.min(node.child_keys().len().saturating_sub(1))
    } else {
        0
    };
    node.child(index)
        .and_then(innermost_block)
        .or_else(|| innermost_block(node))
}

fn move_children(txn: &mut Transaction, from: NodeKey, to: NodeKey) -> Result<()> {
    for child in txn.children(from) {
        let index = txn.children(to).len();
        txn.move_to(child, to, index)?;
    }
    Ok(())
}

fn remap_selection(txn: &mut Transaction, from: NodeKey, to: NodeKey) {
    let Some(mut selection) = txn.selection() else {
        return;
    };
    if selection.anchor.key == from {
        selection.anchor.key = to;
    }
    if selection.focus.key == from {
        selection.focus.key = to;
    }
    txn.set_selection(Some(selection));
}

fn retype_blocks(txn: &mut Transaction, blocks: &[NodeKey], kind: NodeKind) -> Result<()> {
    let mut unwrapped = BTreeSet::new();
    for block in blocks {
        if !txn.contains(*block) {
            continue;
        }
        if matches!(txn.kind(*block)?, NodeKind::ListItem) {
            if let Some(list) = txn.parent(*block) {
                if unwrapped.insert(list) {
                    unwrap_list(txn, list, &kind)?;
                }
            }
            continue;
        }
        txn.set_kind(*block, kind.clone())?;
    }
    Ok(())
}

/// Replace a whole list with one block of `kind` per item.
fn unwrap_list(txn: &mut Transaction, list: NodeKey, kind: &NodeKind) -> Result<()> {
    let mut previous = list;
    for item in txn.children(list) {
        let block = txn.create(kind.clone());
        move_children(txn, item, block)?;
        remap_selection(txn, item, block);
        txn.insert_after(previous, block)?;
        previous = block;
    }
    txn.remove(list)
}

fn wrap_in_lists(txn: &mut Transaction, blocks: &[NodeKey], kind: ListKind) -> Result<()> {
    let mut created = BTreeSet::new();
    for block in blocks {
        if !txn.contains(*block) {
            continue;
        }
        if matches!(txn.kind(*block)?, NodeKind::ListItem) {
            if let Some(list) = txn.parent(*block) {
                if matches!(txn.kind(list)?, NodeKind::List(current) if *current != kind) {
                    txn.set_kind(list, NodeKind::List(kind))?;
                }
            }
            continue;
        }
        let previous = match (txn.parent(*block), txn.index_in_parent(*block)) {
            (Some(parent), Some(index)) if index > 0 => txn.children(parent).get(index - 1).copied(),
            _ => None,
        };
        let list = match previous.filter(|key| created.contains(key)) {
            Some(list) => list,
            None => {
                let list = txn.create(NodeKind::List(kind));
                txn.insert_before(*block, list)?;
                created.insert(list);
                list
            }
        };
        let item = txn.create(NodeKind::ListItem);
        move_children(txn, *block, item)?;
        remap_selection(txn, *block, item);
        txn.append(list, item)?;
        txn.remove(*block)?;
    }
    Ok(())
}
