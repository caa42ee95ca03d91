//! The syntax tree walk that turns a command into explained spans.

use std::collections::HashSet;

use explain_core::ast::{Node, NodeKind, RedirectTarget, Span};
use explain_core::{
    Expansion, ExpansionKind, Explanation, LookupError, ManPage, MatchGroup, MatchResult, OptionSpec,
    ProgramLookup,
};
use tracing::{debug, trace, warn};

use crate::error::{MatchError, Result};
use crate::help::{self, CompoundKind};
use crate::passes;

const SHELL: usize = 0;

/// An entry of the group stack.
#[derive(Debug)]
struct GroupFrame {
    group: usize,
    /// Words that close this group and hand control back to the one below.
    end_tokens: Vec<String>,
    /// The end tokens belong to an enclosing frame.
    inherited: bool,
}

/// An option that was just matched, with the paragraph explaining it.
#[derive(Debug, Clone)]
struct ActiveOption {
    text: String,
    spec: OptionSpec,
}

/// Explains one command string against option metadata.
///
/// A matcher is built per command string and consumed by
/// [`match_tree`](Self::match_tree). Group 0 of the result is the shell
/// group; every resolved or attempted command invocation gets its own group
/// named `command<N>` in the order they are encountered.
///
/// # Examples
///
/// ```
/// use explain_core::ast::{Node, NodeKind, Span};
/// use explain_core::{LookupError, ManPage, ProgramLookup};
/// use explain_matcher::CommandMatcher;
///
/// struct One(ManPage);
///
/// impl ProgramLookup for One {
///     fn find_program(&self, name: &str) -> Result<Vec<ManPage>, LookupError> {
///         if name == self.0.name {
///             Ok(vec![self.0.clone()])
///         } else {
///             Err(LookupError::ProgramNotFound(name.to_string()))
///         }
///     }
/// }
///
/// let store = One(ManPage::new("true.1.gz", "true").with_synopsis("do nothing, successfully"));
/// let word = Node::new(NodeKind::Word { word: "true".into(), parts: vec![] }, Span::new(0, 4));
/// let tree = Node::new(NodeKind::Command { parts: vec![word] }, Span::new(0, 4));
///
/// let explanation = CommandMatcher::new("true", &store).match_tree(Some(&tree)).unwrap();
/// assert_eq!(explanation.groups.len(), 2);
/// assert_eq!(explanation.groups[1].results[0].matched, "true");
/// ```
pub struct CommandMatcher<'a, L: ProgramLookup + ?Sized> {
    source: &'a str,
    lookup: &'a L,
    groups: Vec<MatchGroup>,
    group_stack: Vec<GroupFrame>,
    compound_stack: Vec<CompoundKind>,
    prev_option: Option<ActiveOption>,
    current_option: Option<ActiveOption>,
    consumed_words: HashSet<Span>,
    redirect_targets: HashSet<Span>,
    functions: HashSet<String>,
    expansions: Vec<Expansion>,
}

impl<'a, L: ProgramLookup + ?Sized> CommandMatcher<'a, L> {
    pub fn new(source: &'a str, lookup: &'a L) -> Self {
        Self {
            source,
            lookup,
            groups: vec![MatchGroup::shell()],
            group_stack: vec![GroupFrame {
                group: SHELL,
                end_tokens: Vec::new(),
                inherited: false,
            }],
            compound_stack: Vec::new(),
            prev_option: None,
            current_option: None,
            consumed_words: HashSet::new(),
            redirect_targets: HashSet::new(),
            functions: HashSet::new(),
            expansions: Vec::new(),
        }
    }

    /// Walks `tree` and returns the explained groups.
    ///
    /// `None` stands for a command string the parser found nothing in; only
    /// the shell group is returned.
    ///
    /// # Errors
    ///
    /// - [`MatchError::ProgramNotFound`] if the command is a single simple
    ///   command whose program is unknown.
    /// - [`MatchError::UnsupportedConstruct`] for node kinds outside the
    ///   supported vocabulary.
    /// - [`MatchError::Overlap`] or [`MatchError::OutOfBounds`] if the tree
    ///   positions are inconsistent with the command string.
    pub fn match_tree(mut self, tree: Option<&Node>) -> Result<Explanation> {
        let Some(tree) = tree else {
            warn!(source = self.source, "no syntax tree, nothing to explain");
            passes::mark_unparsed_unknown(&mut self.groups, self.source, 0);
            return self.finish();
        };

        self.visit(tree)?;

        if let Some(err) = self.sole_command_error() {
            return Err(err.into());
        }

        passes::merge_adjacent(&mut self.groups);
        passes::mark_unparsed_unknown(&mut self.groups, self.source, tree.pos.end);
        self.finish()
    }

    fn finish(self) -> Result<Explanation> {
        let mut groups = self.groups;
        passes::fill_matched(&mut groups, self.source)?;
        passes::check_overlaps(&groups)?;
        debug!(groups = groups.len(), expansions = self.expansions.len(), "matched command");
        Ok(Explanation {
            groups,
            expansions: self.expansions,
        })
    }

    /// The lookup error of the only command, when nothing else was explained.
    fn sole_command_error(&mut self) -> Option<LookupError> {
        if self.groups.len() != 2 || !self.groups[SHELL].results.is_empty() || !self.expansions.is_empty() {
            return None;
        }
        let command = &mut self.groups[1];
        if command.manpage.is_some() {
            return None;
        }
        command.error.take()
    }

    fn visit(&mut self, node: &Node) -> Result<()> {
        match &node.kind {
            NodeKind::List { parts } | NodeKind::Pipeline { parts } => self.visit_all(parts),
            NodeKind::Command { parts } => self.visit_command(parts),
            NodeKind::Compound { list, redirects } => {
                self.visit_all(list)?;
                self.visit_all(redirects)
            }
            NodeKind::If { parts } => self.visit_compound(CompoundKind::If, parts),
            NodeKind::While { parts } => self.visit_compound(CompoundKind::While, parts),
            NodeKind::Until { parts } => self.visit_compound(CompoundKind::Until, parts),
            NodeKind::For { parts } => self.visit_for(parts),
            NodeKind::Function { name, body, parts } => self.visit_function(node, name, body, parts),
            NodeKind::Word { word, parts } => {
                self.visit_word(node, word, parts, &[]);
                self.visit_all(parts)
            }
            NodeKind::Assignment { parts, .. } => {
                let holes = self.substitution_interiors(parts);
                self.emit(SHELL, node.pos, Some(help::ASSIGNMENT.to_string()), &holes);
                self.visit_all(parts)
            }
            NodeKind::ReservedWord { word } => {
                if let Some(text) = help::reserved_word(self.compound_stack.last().copied(), word) {
                    self.push_result(SHELL, MatchResult::new(node.pos.start, node.pos.end, Some(text.to_string())));
                }
                Ok(())
            }
            NodeKind::Operator { op } => {
                if let Some(text) = help::operator(self.compound_stack.last().copied(), op) {
                    self.push_result(SHELL, MatchResult::new(node.pos.start, node.pos.end, Some(text.to_string())));
                }
                Ok(())
            }
            NodeKind::Pipe { .. } => {
                self.push_result(
                    SHELL,
                    MatchResult::new(node.pos.start, node.pos.end, Some(help::PIPELINES.to_string())),
                );
                Ok(())
            }
            NodeKind::Redirect {
                redirect_type,
                output,
                heredoc,
                ..
            } => self.visit_redirect(node, redirect_type, output, heredoc.as_deref()),
            NodeKind::Parameter { value } => {
                self.visit_parameter(node, value);
                Ok(())
            }
            NodeKind::CommandSubstitution { command } | NodeKind::ProcessSubstitution { command } => {
                self.visit_substitution(node, command)
            }
            NodeKind::Tilde { .. } | NodeKind::Heredoc { .. } => Ok(()),
            NodeKind::Unsupported => Err(MatchError::UnsupportedConstruct {
                start: node.pos.start,
                end: node.pos.end,
                snippet: self.slice(node.pos).to_string(),
            }),
        }
    }

    fn visit_all(&mut self, nodes: &[Node]) -> Result<()> {
        nodes.iter().try_for_each(|node| self.visit(node))
    }

    fn visit_compound(&mut self, kind: CompoundKind, parts: &[Node]) -> Result<()> {
        self.compound_stack.push(kind);
        let visited = self.visit_all(parts);
        self.compound_stack.pop();
        visited
    }

    fn visit_command(&mut self, parts: &[Node]) -> Result<()> {
        let depth = self.group_stack.len();

        if let Some(first) = parts.iter().position(|p| matches!(p.kind, NodeKind::Word { .. })) {
            if self.is_function_call(&parts[first]) {
                return self.visit_function_call(parts, first);
            }
            self.start_command(&parts[first], &parts[first + 1..], Vec::new(), true);
        }

        for (i, part) in parts.iter().enumerate() {
            match &part.kind {
                NodeKind::Word { word, parts: inner } => {
                    self.visit_word(part, word, inner, &parts[i + 1..]);
                    self.visit_all(inner)?;
                }
                _ => self.visit(part)?,
            }
        }

        self.group_stack.truncate(depth);
        Ok(())
    }

    fn is_function_call(&self, word: &Node) -> bool {
        match &word.kind {
            NodeKind::Word { word, parts } => parts.is_empty() && self.functions.contains(word),
            _ => false,
        }
    }

    fn visit_function_call(&mut self, parts: &[Node], first: usize) -> Result<()> {
        let group = self.current_group();
        for (i, part) in parts.iter().enumerate() {
            match &part.kind {
                NodeKind::Word { word, parts: inner } if i >= first => {
                    let text = if i == first {
                        debug!(function = %word, "call of declared function");
                        help::function_call(word)
                    } else {
                        help::FUNCTION_ARG.to_string()
                    };
                    let holes = self.substitution_interiors(inner);
                    self.emit(group, part.pos, Some(text), &holes);
                    self.consumed_words.insert(part.pos);
                    self.visit_all(inner)?;
                }
                _ => self.visit(part)?,
            }
        }
        Ok(())
    }

    /// Resolves `first` as a program name and opens a group for it.
    ///
    /// With `record_miss` set, a failed lookup or a non-literal name still
    /// opens a group (carrying the error, if any); otherwise nothing happens
    /// and `false` is returned. `end_tokens` are the words that close the
    /// group before the end of the enclosing command; a nested command
    /// without its own is closed by those of the group it runs in.
    fn start_command(&mut self, first: &Node, rest: &[Node], end_tokens: Vec<String>, record_miss: bool) -> bool {
        let NodeKind::Word { word, parts } = &first.kind else {
            return false;
        };

        if !parts.is_empty() {
            if !record_miss {
                return false;
            }
            debug!(word = %word, "program name is not a literal");
            let group = MatchGroup::new(self.next_group_name());
            self.push_group(group, end_tokens, !record_miss);
            return true;
        }

        let mut pages = match self.find_program(word) {
            Ok(pages) => pages,
            Err(err) => {
                if !record_miss {
                    debug!(program = %word, "not a nested command");
                    return false;
                }
                debug!(program = %word, error = %err, "program lookup failed");
                let mut group = MatchGroup::new(self.next_group_name());
                group.error = Some(err);
                self.push_group(group, end_tokens, !record_miss);
                return true;
            }
        };

        let mut span = first.pos;
        let mut consumed = vec![first.pos];
        if pages.first().is_some_and(|page| page.multi_command) {
            if let Some((next, subcommand)) = rest.first().and_then(|n| literal_word(n).map(|w| (n, w))) {
                let name = format!("{word} {subcommand}");
                match self.find_program(&name) {
                    Ok(found) => {
                        debug!(program = %name, "resolved subcommand");
                        pages = found;
                        span.end = next.pos.end;
                        consumed.push(next.pos);
                    }
                    Err(_) => debug!(program = %name, "no subcommand page, using the base program"),
                }
            }
        }

        let page = pages.remove(0);
        let synopsis = page
            .synopsis
            .clone()
            .unwrap_or_else(|| help::NO_SYNOPSIS.to_string());
        let mut group = MatchGroup::new(self.next_group_name());
        group.results.push(MatchResult::new(span.start, span.end, Some(synopsis)));
        group.manpage = Some(page);
        if !pages.is_empty() {
            group.suggestions = Some(pages);
        }
        self.consumed_words.extend(consumed);
        self.push_group(group, end_tokens, !record_miss);
        true
    }

    fn find_program(&self, name: &str) -> std::result::Result<Vec<ManPage>, LookupError> {
        let pages = self.lookup.find_program(name)?;
        if pages.is_empty() {
            return Err(LookupError::ProgramNotFound(name.to_string()));
        }
        Ok(pages)
    }

    fn visit_word(&mut self, node: &Node, word: &str, parts: &[Node], rest: &[Node]) {
        if self.consumed_words.contains(&node.pos) || self.redirect_targets.contains(&node.pos) {
            return;
        }
        let holes = self.substitution_interiors(parts);
        let raw = self.slice(node.pos);

        if let Some(owner) = self.closing_frame(word, raw) {
            self.group_stack.truncate(owner);
            let parent = self.current_group();
            let text = self.groups[parent].results.last().and_then(|r| r.text.clone());
            debug!(token = %word, group = %self.groups[parent].name, "nested command closed");
            self.emit(parent, node.pos, text, &holes);
            self.prev_option = None;
            self.current_option = None;
            return;
        }

        let group = self.current_group();
        let Some(page) = self.groups[group].manpage.as_ref() else {
            self.emit(group, node.pos, None, &holes);
            return;
        };
        let partial_match = page.partial_match;
        let nested = page.nested_command.clone();
        let argument = page.arguments().first().map(|(_, text)| text.clone());

        self.prev_option = self.current_option.take();

        let (flag, has_value) = match word.split_once('=') {
            Some((flag, _)) if word.starts_with("--") => (flag, true),
            _ => (word, false),
        };
        if let Some(found) = self.find_option(group, flag) {
            trace!(option = %flag, "exact option match");
            self.emit(group, node.pos, Some(found.text.clone()), &holes);
            if !has_value {
                self.current_option = Some(found);
            }
            return;
        }

        if raw == word && is_short_cluster(word) {
            let (results, last) = self.attempt_fuzzy(group, node.pos, word);
            self.groups[group].results.extend(results);
            self.current_option = last;
            return;
        }

        if let Some(prev) = self.prev_option.take() {
            if prev.spec.expects_arg().accepts(word) {
                let nested_option = prev.spec.nested_command();
                if nested_option.is_enabled() {
                    let end_tokens = nested_option.end_tokens().to_vec();
                    if self.start_command(node, rest, end_tokens, false) {
                        debug!(option = %prev.text.lines().next().unwrap_or(""), "option starts a nested command");
                        return;
                    }
                }
                self.extend_last(group, node.pos, &holes);
                return;
            }
        }

        if partial_match && raw == word {
            let (results, last) = self.attempt_fuzzy(group, node.pos, word);
            if results.iter().all(|r| !r.is_unknown()) {
                self.groups[group].results.extend(results);
                self.current_option = last;
                return;
            }
        }

        if let Some(text) = argument {
            if nested.is_enabled() && self.start_command(node, rest, nested.end_tokens().to_vec(), false) {
                return;
            }
            self.emit(group, node.pos, Some(text), &holes);
            return;
        }

        self.emit(group, node.pos, None, &holes);
    }

    /// The index of the frame owning the end token `word`, when it closes
    /// the current group.
    fn closing_frame(&self, word: &str, raw: &str) -> Option<usize> {
        let top = self.group_stack.last()?;
        if self.group_stack.len() <= 1 || !top.end_tokens.iter().any(|t| t == word || t == raw) {
            return None;
        }
        let owner = self.group_stack.iter().rposition(|frame| !frame.inherited)?;
        (owner > 0).then_some(owner)
    }

    fn find_option(&self, group: usize, flag: &str) -> Option<ActiveOption> {
        let page = self.groups[group].manpage.as_ref()?;
        let paragraph = page.find_option(flag)?;
        let spec = paragraph.option.clone()?;
        Some(ActiveOption {
            text: paragraph.text.clone(),
            spec,
        })
    }

    /// Matches `chars` as a cluster of single-letter options.
    ///
    /// The first option of a dashed cluster that expects an argument takes
    /// the whole word; a letter that matches nothing right after an option
    /// expecting an argument is that option's argument, up to the end of the
    /// word. Returns the results and the option the last letter resolved to.
    fn attempt_fuzzy(&self, group: usize, span: Span, chars: &str) -> (Vec<MatchResult>, Option<ActiveOption>) {
        let dashed = chars.starts_with('-');
        let tokens: Vec<&str> = if dashed {
            let split = chars.char_indices().nth(2).map_or(chars.len(), |(i, _)| i);
            std::iter::once(&chars[..split]).chain(letters(&chars[split..])).collect()
        } else {
            letters(chars).collect()
        };

        let mut results: Vec<MatchResult> = Vec::new();
        let mut pos = span.start;
        let mut prev: Option<ActiveOption> = None;
        for token in tokens {
            let flag = if token.starts_with('-') {
                token.to_string()
            } else {
                format!("-{token}")
            };
            let found = self.find_option(group, &flag);
            match &found {
                Some(option) => {
                    if dashed && results.is_empty() && option.spec.expects_arg().is_expected() {
                        trace!(option = %flag, "option takes the rest of the word");
                        return (vec![MatchResult::new(span.start, span.end, Some(option.text.clone()))], None);
                    }
                    results.push(MatchResult::new(pos, pos + token.len(), Some(option.text.clone())));
                }
                None if dashed && prev.as_ref().is_some_and(|p| p.spec.expects_arg().is_expected()) => {
                    if let Some(previous) = results.last_mut() {
                        previous.end = span.end;
                    }
                    return (results, None);
                }
                None => results.push(MatchResult::unknown(pos, pos + token.len())),
            }
            pos += token.len();
            prev = found;
        }
        (results, prev)
    }

    /// Stretches the last result of `group` over `word`, the argument of the
    /// option it explains.
    fn extend_last(&mut self, group: usize, word: Span, holes: &[Span]) {
        let Some(last) = self.groups[group].results.last() else {
            self.emit(group, word, None, holes);
            return;
        };
        let text = last.text.clone();
        let gap = Span::new(last.end.min(word.start), word.start);
        if !self.slice(gap).trim().is_empty() {
            self.emit(group, word, text, holes);
            return;
        }

        let mut pieces = passes::split_around(Span::new(last.start, word.end), holes).into_iter();
        if let (Some(first), Some(last)) = (pieces.next(), self.groups[group].results.last_mut()) {
            last.end = first.end;
        }
        for piece in pieces {
            self.push_result(group, MatchResult::new(piece.start, piece.end, text.clone()));
        }
    }

    fn visit_for(&mut self, parts: &[Node]) -> Result<()> {
        self.compound_stack.push(CompoundKind::For);
        let visited = parts.iter().try_for_each(|part| match &part.kind {
            NodeKind::Word { parts: inner, .. } => {
                let holes = self.substitution_interiors(inner);
                self.emit(SHELL, part.pos, Some(help::FOR.to_string()), &holes);
                self.visit_all(inner)
            }
            _ => self.visit(part),
        });
        self.compound_stack.pop();
        visited
    }

    fn visit_function(&mut self, node: &Node, name: &Node, body: &Node, parts: &[Node]) -> Result<()> {
        if let Some(name) = name.as_word() {
            debug!(function = %name, "function declared");
            self.functions.insert(name.to_string());
        }
        let text = || Some(help::FUNCTION.to_string());

        if let NodeKind::Compound { list, redirects } = &body.kind {
            let braces = list.first().zip(list.last()).filter(|(open, close)| {
                list.len() >= 2 && is_reserved(open, "{") && is_reserved(close, "}")
            });
            if let Some((open, close)) = braces {
                self.push_result(SHELL, MatchResult::new(node.pos.start, open.pos.end, text()));
                self.push_result(SHELL, MatchResult::new(close.pos.start, close.pos.end, text()));
                self.visit_all(&list[1..list.len() - 1])?;
                return self.visit_all(redirects);
            }
        }

        let declaration_end = parts
            .iter()
            .position(|part| part.pos == body.pos)
            .and_then(|i| i.checked_sub(1))
            .map_or(name.pos.end, |i| parts[i].pos.end);
        self.push_result(SHELL, MatchResult::new(node.pos.start, declaration_end, text()));
        self.visit(body)
    }

    fn visit_redirect(
        &mut self,
        node: &Node,
        redirect_type: &str,
        output: &RedirectTarget,
        heredoc: Option<&Node>,
    ) -> Result<()> {
        let duplicates_fd = matches!(output, RedirectTarget::Fd(_));
        let text = help::redirection(redirect_type, duplicates_fd);

        let target_parts: &[Node] = match output {
            RedirectTarget::Word(target) => {
                self.redirect_targets.insert(target.pos);
                match &target.kind {
                    NodeKind::Word { parts, .. } => parts,
                    _ => &[],
                }
            }
            RedirectTarget::Fd(_) => &[],
        };
        let holes = self.substitution_interiors(target_parts);
        self.emit(SHELL, node.pos, Some(text), &holes);
        self.visit_all(target_parts)?;

        if let Some(heredoc) = heredoc {
            self.visit(heredoc)?;
        }
        Ok(())
    }

    fn visit_parameter(&mut self, node: &Node, value: &str) {
        let kind = if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            ExpansionKind::ParameterDigits
        } else if let Some(name) = help::special_parameter(value) {
            ExpansionKind::ParameterNamed(name.to_string())
        } else {
            ExpansionKind::Parameter
        };
        self.expansions.push(Expansion::new(node.pos, kind));
    }

    fn visit_substitution(&mut self, node: &Node, command: &Node) -> Result<()> {
        let interior = self.interior(node.pos);
        self.expansions
            .push(Expansion::new(interior, ExpansionKind::Substitution));

        let prev = self.prev_option.take();
        let current = self.current_option.take();
        let depth = self.group_stack.len();
        let visited = self.visit(command);
        self.group_stack.truncate(depth);
        self.prev_option = prev;
        self.current_option = current;
        visited
    }

    /// The text between the delimiters of a substitution.
    fn interior(&self, span: Span) -> Span {
        let text = self.slice(span);
        let (open, close) = if text.starts_with("$(") || text.starts_with("<(") || text.starts_with(">(") {
            (2, 1)
        } else if text.starts_with('`') {
            (1, 1)
        } else {
            (0, 0)
        };
        let start = (span.start + open).min(span.end);
        Span::new(start, span.end.saturating_sub(close).max(start))
    }

    fn substitution_interiors(&self, parts: &[Node]) -> Vec<Span> {
        parts
            .iter()
            .filter(|part| {
                matches!(
                    part.kind,
                    NodeKind::CommandSubstitution { .. } | NodeKind::ProcessSubstitution { .. }
                )
            })
            .map(|part| self.interior(part.pos))
            .collect()
    }

    fn emit(&mut self, group: usize, span: Span, text: Option<String>, holes: &[Span]) {
        for piece in passes::split_around(span, holes) {
            self.push_result(group, MatchResult::new(piece.start, piece.end, text.clone()));
        }
    }

    fn push_result(&mut self, group: usize, result: MatchResult) {
        self.groups[group].results.push(result);
    }

    fn push_group(&mut self, group: MatchGroup, end_tokens: Vec<String>, nested: bool) {
        let (end_tokens, inherited) = match self.group_stack.last() {
            Some(top) if nested && end_tokens.is_empty() && !top.end_tokens.is_empty() => {
                (top.end_tokens.clone(), true)
            }
            _ => (end_tokens, false),
        };
        debug!(group = %group.name, inherited, "opened group");
        self.groups.push(group);
        self.group_stack.push(GroupFrame {
            group: self.groups.len() - 1,
            end_tokens,
            inherited,
        });
        self.prev_option = None;
        self.current_option = None;
    }

    fn next_group_name(&self) -> String {
        format!("command{}", self.groups.len() - 1)
    }

    fn current_group(&self) -> usize {
        self.group_stack.last().map_or(SHELL, |frame| frame.group)
    }

    fn slice(&self, span: Span) -> &'a str {
        self.source.get(span.start..span.end).unwrap_or("")
    }
}

fn literal_word(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Word { word, parts } if parts.is_empty() => Some(word),
        _ => None,
    }
}

fn is_reserved(node: &Node, expected: &str) -> bool {
    matches!(&node.kind, NodeKind::ReservedWord { word } if word == expected)
}

/// `-la`: a single dash followed by more than one character.
fn is_short_cluster(word: &str) -> bool {
    word.starts_with('-') && !word.starts_with("--") && word.chars().count() > 2
}

fn letters(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .map(move |(i, c)| &text[i..i + c.len_utf8()])
}
