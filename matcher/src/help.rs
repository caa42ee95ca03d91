//! Explanations for shell syntax that is not a program.
//!
//! Reserved words and operators are looked up in the table of the innermost
//! compound statement first, then in the unscoped table.

/// The compound statements that change how reserved words read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    For,
    While,
    Until,
    If,
}

pub const NO_SYNOPSIS: &str = "no synopsis found";

pub const PIPELINES: &str = "A <b>pipeline</b> is a sequence of one or more commands separated by the control \
operator <b>|</b> or <b>|&amp;</b>. The standard output of each command is connected through a pipe to the \
standard input of the next command; with <b>|&amp;</b> its standard error is connected as well.";

pub const REDIRECTION: &str = "Before a command is executed, its input and output may be <b>redirected</b> \
using a special notation interpreted by the shell. Redirections are processed in the order they appear, \
from left to right.";

const REDIRECTING_INPUT: &str = "<b>Redirecting Input</b>: the file whose name results from the expansion of \
<i>word</i> is opened for reading on file descriptor <i>n</i>, or the standard input if <i>n</i> is not \
specified.";

const REDIRECTING_OUTPUT: &str = "<b>Redirecting Output</b>: the file whose name results from the expansion of \
<i>word</i> is opened for writing on file descriptor <i>n</i>, or the standard output if <i>n</i> is not \
specified. The file is created if it does not exist and truncated to zero size if it does.";

const APPENDING_OUTPUT: &str = "<b>Appending Redirected Output</b>: the file whose name results from the \
expansion of <i>word</i> is opened for appending on file descriptor <i>n</i>, or the standard output if \
<i>n</i> is not specified. The file is created if it does not exist.";

const REDIRECTING_STDOUT_STDERR: &str = "<b>Redirecting Standard Output and Standard Error</b>: both the \
standard output and the standard error are redirected to the file whose name is the expansion of \
<i>word</i>.";

const DUPLICATING_OUTPUT: &str = "<b>Duplicating File Descriptors</b>: file descriptor <i>n</i>, or the \
standard output if <i>n</i> is not specified, is made a copy of the output file descriptor given after \
<b>&gt;&amp;</b>.";

const DUPLICATING_INPUT: &str = "<b>Duplicating File Descriptors</b>: file descriptor <i>n</i>, or the \
standard input if <i>n</i> is not specified, is made a copy of the input file descriptor given after \
<b>&lt;&amp;</b>.";

const HERE_DOCUMENT: &str = "<b>Here Documents</b>: the shell reads input from the current source until a \
line containing only the delimiter is seen. All lines read up to that point are used as the standard \
input of the command.";

const HERE_STRING: &str = "<b>Here Strings</b>: the <i>word</i> is expanded and supplied to the command on \
its standard input.";

const OPEN_READ_WRITE: &str = "<b>Opening File Descriptors for Reading and Writing</b>: the file whose name \
is the expansion of <i>word</i> is opened for both reading and writing on file descriptor <i>n</i>, or on \
file descriptor 0 if <i>n</i> is not specified.";

const CLOBBER: &str = "<b>Redirecting Output</b> with <b>&gt;|</b> overwrites the file even if the \
<b>noclobber</b> option is set.";

pub const ASSIGNMENT: &str = "A <b>variable</b> may be assigned to by a statement of the form \
<i>name</i>=[<i>value</i>]. If <i>value</i> is not given, the variable is assigned the null string.";

pub const COMMENT: &str = "A word beginning with <b>#</b> causes that word and all remaining characters on \
that line to be ignored.";

pub const FUNCTION: &str = "A <b>shell function</b> is an object that is called like a simple command and \
executes a compound command with a new set of positional parameters. The body of the function is the \
compound command between { and }.";

pub const FUNCTION_ARG: &str = "An argument passed to the shell function; inside the function it is available \
as a positional parameter.";

pub const FOR: &str = "<b>for</b> <i>name</i> [ [ <b>in</b> [ <i>word ...</i> ] ] ; ] <b>do</b> <i>list</i> ; \
<b>done</b>\nThe list of words following <b>in</b> is expanded, generating a list of items. The variable \
<i>name</i> is set to each element of this list in turn, and <i>list</i> is executed each time.";

const WHILE: &str = "<b>while</b> <i>list-1</i>; <b>do</b> <i>list-2</i>; <b>done</b>\nThe <b>while</b> \
command continuously executes the list <i>list-2</i> as long as the last command in the list \
<i>list-1</i> returns an exit status of zero.";

const UNTIL: &str = "<b>until</b> <i>list-1</i>; <b>do</b> <i>list-2</i>; <b>done</b>\nThe <b>until</b> \
command is identical to the <b>while</b> command, except that the test is negated; <i>list-2</i> is \
executed as long as the last command in <i>list-1</i> returns a non-zero exit status.";

const IF: &str = "<b>if</b> <i>list</i>; <b>then</b> <i>list</i>; [ <b>elif</b> <i>list</i>; <b>then</b> \
<i>list</i>; ] ... [ <b>else</b> <i>list</i>; ] <b>fi</b>\nThe <b>if</b> <i>list</i> is executed. If its \
exit status is zero, the <b>then</b> <i>list</i> is executed. Otherwise, each <b>elif</b> <i>list</i> is \
executed in turn, and if its exit status is zero, the corresponding <b>then</b> <i>list</i> is executed \
and the command completes. Otherwise, the <b>else</b> <i>list</i> is executed, if present.";

const LOOP_BODY: &str = "The commands between <b>do</b> and <b>done</b> form the body of the loop.";

const GROUP: &str = "{ <i>list</i>; }\n<i>list</i> is simply executed in the current shell environment. \
<i>list</i> must be terminated with a newline or semicolon.";

const SUBSHELL: &str = "( <i>list</i> )\n<i>list</i> is executed in a subshell environment. Variable \
assignments and builtin commands that affect the shell's environment do not remain in effect after the \
command completes.";

const NEGATION: &str = "If the reserved word <b>!</b> precedes a pipeline, the exit status of that pipeline \
is the logical negation of the exit status of the last command.";

const SEQUENTIAL: &str = "Commands separated by a <b>;</b> are executed sequentially; the shell waits for each \
command to terminate in turn. The return status is the exit status of the last command executed.";

const BACKGROUND: &str = "If a command is terminated by the control operator <b>&amp;</b>, the shell executes \
the command in the <i>background</i> in a subshell. The shell does not wait for the command to finish, and \
the return status is 0.";

const AND_LIST: &str = "<i>command1</i> <b>&amp;&amp;</b> <i>command2</i>\n<i>command2</i> is executed if, \
and only if, <i>command1</i> returns an exit status of zero.";

const OR_LIST: &str = "<i>command1</i> <b>||</b> <i>command2</i>\n<i>command2</i> is executed if and only \
if <i>command1</i> returns a non-zero exit status.";

/// Help text for a call of a function declared in the same command.
pub fn function_call(name: &str) -> String {
    format!("call shell function <b>{name}</b>")
}

/// Help for a reserved word, scoped to the innermost compound statement.
pub fn reserved_word(scope: Option<CompoundKind>, word: &str) -> Option<&'static str> {
    scope
        .and_then(|kind| compound_reserved_word(kind, word))
        .or_else(|| unscoped_reserved_word(word))
}

fn compound_reserved_word(kind: CompoundKind, word: &str) -> Option<&'static str> {
    match (kind, word) {
        (CompoundKind::For, "for" | "in") => Some(FOR),
        (CompoundKind::For, "do" | "done") => Some(FOR),
        (CompoundKind::While, "while" | "do" | "done") => Some(WHILE),
        (CompoundKind::Until, "until" | "do" | "done") => Some(UNTIL),
        (CompoundKind::If, "if" | "then" | "elif" | "else" | "fi") => Some(IF),
        _ => None,
    }
}

fn unscoped_reserved_word(word: &str) -> Option<&'static str> {
    match word {
        "for" | "in" => Some(FOR),
        "while" => Some(WHILE),
        "until" => Some(UNTIL),
        "if" | "then" | "elif" | "else" | "fi" => Some(IF),
        "do" | "done" => Some(LOOP_BODY),
        "{" | "}" => Some(GROUP),
        "(" | ")" => Some(SUBSHELL),
        "!" => Some(NEGATION),
        _ => None,
    }
}

/// Help for a list operator, scoped to the innermost compound statement.
///
/// Inside a compound statement a `;` reads as part of its syntax, so it
/// gets the statement's own help.
pub fn operator(scope: Option<CompoundKind>, op: &str) -> Option<&'static str> {
    if op == ";" {
        if let Some(kind) = scope {
            return Some(compound_help(kind));
        }
    }
    match op {
        ";" | "\n" => Some(SEQUENTIAL),
        "&" => Some(BACKGROUND),
        "&&" => Some(AND_LIST),
        "||" => Some(OR_LIST),
        _ => None,
    }
}

fn compound_help(kind: CompoundKind) -> &'static str {
    match kind {
        CompoundKind::For => FOR,
        CompoundKind::While => WHILE,
        CompoundKind::Until => UNTIL,
        CompoundKind::If => IF,
    }
}

/// Help for a redirection operator.
///
/// `duplicates_fd` selects the descriptor-duplication reading of `>&` and
/// `<&` when the target is a file descriptor.
pub fn redirection(redirect_type: &str, duplicates_fd: bool) -> String {
    let kind = match (redirect_type, duplicates_fd) {
        (">&", true) => DUPLICATING_OUTPUT,
        ("<&", true) => DUPLICATING_INPUT,
        ("<" | "<&", _) => REDIRECTING_INPUT,
        (">>", _) => APPENDING_OUTPUT,
        ("&>" | ">&" | "&>>", _) => REDIRECTING_STDOUT_STDERR,
        ("<<" | "<<-", _) => HERE_DOCUMENT,
        ("<<<", _) => HERE_STRING,
        ("<>", _) => OPEN_READ_WRITE,
        (">|", _) => CLOBBER,
        _ => REDIRECTING_OUTPUT,
    };
    format!("{REDIRECTION}\n\n{kind}")
}

/// Descriptive name of a special parameter (`?` → `exit_status`).
pub fn special_parameter(name: &str) -> Option<&'static str> {
    match name {
        "*" => Some("star"),
        "@" => Some("at"),
        "#" => Some("count"),
        "?" => Some("exit_status"),
        "-" => Some("hyphen"),
        "$" => Some("pid"),
        "!" => Some("background_pid"),
        "_" => Some("underscore"),
        _ => None,
    }
}
