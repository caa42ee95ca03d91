//! Fixture man pages and a small syntax tree builder for matcher tests.

#![allow(dead_code)]

use explain_core::ast::{Node, NodeKind, RedirectTarget, Span};
use explain_core::{ExpectsArg, LookupError, ManPage, NestedCommand, OptionSpec, Paragraph, ProgramLookup};

pub struct Fixtures(Vec<ManPage>);

impl ProgramLookup for Fixtures {
    fn find_program(&self, name: &str) -> Result<Vec<ManPage>, LookupError> {
        let found: Vec<ManPage> = self.0.iter().filter(|p| p.name == name).cloned().collect();
        if found.is_empty() {
            return Err(LookupError::ProgramNotFound(name.to_string()));
        }
        Ok(found)
    }
}

fn short(flags: &[&str]) -> OptionSpec {
    OptionSpec::new(flags.iter().map(|f| f.to_string()).collect(), vec![])
}

fn long(flag: &str) -> OptionSpec {
    OptionSpec::new(vec![], vec![flag.to_string()])
}

pub fn fixtures() -> Fixtures {
    let bar = ManPage::new("bar.1.gz", "bar")
        .with_synopsis("bar synopsis")
        .with_paragraphs(vec![
            Paragraph::option(0, "-a desc", "OPTIONS", short(&["-a"])),
            Paragraph::option(1, "-b <arg> desc", "OPTIONS", short(&["-b"]).expecting_argument()),
            Paragraph::option(2, "--help desc", "OPTIONS", long("--help")),
            Paragraph::option(3, "-x, -y desc", "OPTIONS", short(&["-x", "-y"])),
            Paragraph::option(4, "--file=FILE desc", "OPTIONS", long("--file").expecting_argument()),
        ]);

    let baz = ManPage::new("baz.1.gz", "baz").with_synopsis("baz synopsis");

    let ls = ManPage::new("ls.1.gz", "ls")
        .with_synopsis("list directory contents")
        .with_paragraphs(vec![
            Paragraph::option(0, "-l desc", "", short(&["-l"])),
            Paragraph::option(1, "-a desc", "", short(&["-a"])),
            Paragraph::option(
                2,
                "--color=WHEN desc",
                "",
                long("--color").with_expects_arg(ExpectsArg::Values(vec!["auto".into(), "never".into()])),
            ),
        ]);

    let exec = short(&["-exec"])
        .expecting_argument()
        .with_nested_command(NestedCommand::EndTokens(vec![r"\;".to_string(), "+".to_string()]))
        .unwrap();
    let find = ManPage::new("find.1.gz", "find")
        .with_synopsis("search for files")
        .with_paragraphs(vec![
            Paragraph::option(0, "-exec desc", "ACTIONS", exec),
            Paragraph::option(1, "-name desc", "TESTS", short(&["-name"]).expecting_argument()),
        ]);

    let mut sudo = ManPage::new("sudo.8.gz", "sudo")
        .with_synopsis("execute a command as another user")
        .with_paragraphs(vec![
            Paragraph::option(0, "-u user desc", "", short(&["-u"]).expecting_argument()),
            Paragraph::option(1, "command desc", "", OptionSpec::positional("command")),
        ]);
    sudo.nested_command = NestedCommand::Flag(true);

    let mut tar = ManPage::new("tar.1.gz", "tar")
        .with_synopsis("an archiving utility")
        .with_paragraphs(vec![
            Paragraph::option(0, "-x desc", "", short(&["-x"])),
            Paragraph::option(1, "-v desc", "", short(&["-v"])),
            Paragraph::option(2, "-f desc", "", short(&["-f"]).expecting_argument()),
            Paragraph::option(3, "-z desc", "", short(&["-z"])),
        ]);
    tar.partial_match = true;

    let mut git = ManPage::new("git.1.gz", "git").with_synopsis("the stupid content tracker");
    git.multi_command = true;
    let git_commit = ManPage::new("git-commit.1.gz", "git commit")
        .with_synopsis("record changes to the repository")
        .with_paragraphs(vec![Paragraph::option(0, "-m msg desc", "", short(&["-m"]).expecting_argument())]);

    Fixtures(vec![bar, baz, ls, find, sudo, tar, git, git_commit])
}

/// Builds nodes whose spans are found by searching the source left to right.
pub struct TreeBuilder<'s> {
    source: &'s str,
    cursor: usize,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, cursor: 0 }
    }

    fn locate(&mut self, text: &str) -> Span {
        let offset = self.source[self.cursor..]
            .find(text)
            .unwrap_or_else(|| panic!("{text:?} not found after {} in {:?}", self.cursor, self.source));
        let start = self.cursor + offset;
        self.cursor = start + text.len();
        Span::new(start, self.cursor)
    }

    pub fn word(&mut self, text: &str) -> Node {
        let pos = self.locate(text);
        Node::new(
            NodeKind::Word {
                word: text.to_string(),
                parts: vec![],
            },
            pos,
        )
    }

    /// A word whose literal differs from its source text, e.g. after quote
    /// removal.
    pub fn quoted(&mut self, raw: &str, word: &str) -> Node {
        let pos = self.locate(raw);
        Node::new(
            NodeKind::Word {
                word: word.to_string(),
                parts: vec![],
            },
            pos,
        )
    }

    /// A word with expansions; `parts` builds them from the word's start.
    pub fn word_with(&mut self, text: &str, parts: impl FnOnce(&mut Self) -> Vec<Node>) -> Node {
        let pos = self.locate(text);
        self.cursor = pos.start;
        let parts = parts(self);
        self.cursor = pos.end;
        Node::new(
            NodeKind::Word {
                word: text.to_string(),
                parts,
            },
            pos,
        )
    }

    pub fn parameter(&mut self, raw: &str, value: &str) -> Node {
        let pos = self.locate(raw);
        Node::new(NodeKind::Parameter { value: value.to_string() }, pos)
    }

    pub fn substitution(&mut self, inner: impl FnOnce(&mut Self) -> Node) -> Node {
        let open = self.locate("$(");
        let command = inner(self);
        let close = self.locate(")");
        Node::new(
            NodeKind::CommandSubstitution {
                command: Box::new(command),
            },
            Span::new(open.start, close.end),
        )
    }

    pub fn assignment(&mut self, text: &str) -> Node {
        let pos = self.locate(text);
        Node::new(
            NodeKind::Assignment {
                word: text.to_string(),
                parts: vec![],
            },
            pos,
        )
    }

    pub fn operator(&mut self, op: &str) -> Node {
        let pos = self.locate(op);
        Node::new(NodeKind::Operator { op: op.to_string() }, pos)
    }

    pub fn pipe(&mut self) -> Node {
        let pos = self.locate("|");
        Node::new(NodeKind::Pipe { pipe: "|".to_string() }, pos)
    }

    pub fn reserved(&mut self, word: &str) -> Node {
        let pos = self.locate(word);
        Node::new(NodeKind::ReservedWord { word: word.to_string() }, pos)
    }

    /// `> target` style redirect to a file.
    pub fn redirect_to_file(&mut self, op: &str, target: &str) -> Node {
        let op_pos = self.locate(op);
        let target = self.word(target);
        let pos = Span::new(op_pos.start, target.pos.end);
        Node::new(
            NodeKind::Redirect {
                input: None,
                redirect_type: op.to_string(),
                output: RedirectTarget::Word(Box::new(target)),
                heredoc: None,
            },
            pos,
        )
    }

    /// `2>&1` style redirect to a file descriptor.
    pub fn redirect_to_fd(&mut self, raw: &str, input: u32, op: &str, fd: u32) -> Node {
        let pos = self.locate(raw);
        Node::new(
            NodeKind::Redirect {
                input: Some(input),
                redirect_type: op.to_string(),
                output: RedirectTarget::Fd(fd),
                heredoc: None,
            },
            pos,
        )
    }
}

fn enclosing(parts: &[Node]) -> Span {
    let start = parts.first().map_or(0, |p| p.pos.start);
    let end = parts.last().map_or(0, |p| p.pos.end);
    Span::new(start, end)
}

pub fn command(parts: Vec<Node>) -> Node {
    let pos = enclosing(&parts);
    Node::new(NodeKind::Command { parts }, pos)
}

pub fn pipeline(parts: Vec<Node>) -> Node {
    let pos = enclosing(&parts);
    Node::new(NodeKind::Pipeline { parts }, pos)
}

pub fn list(parts: Vec<Node>) -> Node {
    let pos = enclosing(&parts);
    Node::new(NodeKind::List { parts }, pos)
}

pub fn compound(list: Vec<Node>) -> Node {
    let pos = enclosing(&list);
    Node::new(NodeKind::Compound { list, redirects: vec![] }, pos)
}

pub fn node(kind: fn(Vec<Node>) -> NodeKind, parts: Vec<Node>) -> Node {
    let pos = enclosing(&parts);
    Node::new(kind(parts), pos)
}

pub fn function(name: Node, body: Node, parts: Vec<Node>) -> Node {
    let pos = enclosing(&parts);
    Node::new(
        NodeKind::Function {
            name: Box::new(name),
            body: Box::new(body),
            parts,
        },
        pos,
    )
}
