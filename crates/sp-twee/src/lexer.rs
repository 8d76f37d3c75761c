use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Markup token for Twee passage text.
///
/// The lexer only knows about the characters that carry structure: link
/// brackets, macro brackets, pipes and newlines. Everything else is `Text`.
/// Links, choice macros and bracket balance are recovered from the token
/// stream by [`scan`] and [`check_balance`].
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Link opener `[[`.
    #[token("[[")]
    LinkOpen,
    /// Link closer `]]`.
    #[token("]]")]
    LinkClose,
    /// Single `[`.
    #[token("[")]
    LBracket,
    /// Single `]`.
    #[token("]")]
    RBracket,
    /// Macro opener `<<`.
    #[token("<<")]
    MacroOpen,
    /// Macro closer `>>`.
    #[token(">>")]
    MacroClose,
    /// Link separator `|`.
    #[token("|")]
    Pipe,
    /// Line break.
    #[token("\n")]
    Newline,
    /// A lone `<` or `>`.
    #[regex(r"[<>]")]
    Angle,
    /// Any run of characters without structural meaning.
    #[regex(r"[^\[\]<>|\n]+")]
    Text,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LinkOpen => write!(f, "[["),
            Token::LinkClose => write!(f, "]]"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::MacroOpen => write!(f, "<<"),
            Token::MacroClose => write!(f, ">>"),
            Token::Pipe => write!(f, "|"),
            Token::Newline => write!(f, "newline"),
            Token::Angle => write!(f, "angle bracket"),
            Token::Text => write!(f, "text"),
        }
    }
}

/// Lex passage text into `(Token, Span)` pairs.
///
/// Every byte is covered by some token, so the stream can be used to rebuild
/// the source exactly. Should logos ever reject input, the span is kept as
/// `Text` rather than dropped.
pub fn lex(source: &str) -> Vec<(Token, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        tokens.push((result.unwrap_or(Token::Text), span));
    }

    tokens
}

// ---------------------------------------------------------------------------
// Structural scan
// ---------------------------------------------------------------------------

/// A `[[...]]` link found in passage text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte range including both bracket pairs.
    pub outer: Range<usize>,
    /// Byte range between the brackets.
    pub inner: Range<usize>,
}

impl LinkSpan {
    /// The raw text between the brackets.
    pub fn inner<'a>(&self, source: &'a str) -> &'a str {
        &source[self.inner.clone()]
    }

    /// Byte range of the target: the text after the last `|`, or the whole
    /// inner text when there is no pipe.
    pub fn target_range(&self, source: &str) -> Range<usize> {
        match self.inner(source).rfind('|') {
            Some(pipe) => self.inner.start + pipe + 1..self.inner.end,
            None => self.inner.clone(),
        }
    }

    /// The link target.
    pub fn target<'a>(&self, source: &'a str) -> &'a str {
        &source[self.target_range(source)]
    }

    /// Whether the link carries separate display text (`[[text|target]]`).
    pub fn has_display(&self, source: &str) -> bool {
        self.inner(source).contains('|')
    }

    /// Text shown to the reader: everything before the first `|`, or the
    /// whole inner text.
    pub fn label<'a>(&self, source: &'a str) -> &'a str {
        let inner = self.inner(source);
        inner.split('|').next().unwrap_or(inner)
    }
}

/// A `<<choice "target">>` macro found in passage text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSpan {
    /// Byte range of the whole macro.
    pub outer: Range<usize>,
    /// Byte range of the quoted target (without quotes).
    pub target: Range<usize>,
}

/// Any `<<...>>` macro found on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSpan {
    /// Byte range of the whole macro.
    pub outer: Range<usize>,
    /// Byte range of the macro body.
    pub body: Range<usize>,
}

/// The structural elements of one passage text, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    /// Bracket links.
    pub links: Vec<LinkSpan>,
    /// Choice macros.
    pub choices: Vec<ChoiceSpan>,
    /// All macros, choice macros included.
    pub macros: Vec<MacroSpan>,
}

/// Find links, choice macros and macros in `source`.
///
/// Links and macros never span lines: a newline abandons an open `[[` or
/// `<<`. A `[[` seen while a link is already open is plain text.
pub fn scan(source: &str) -> Markup {
    let tokens = lex(source);
    let mut markup = Markup::default();
    let mut link_open: Option<usize> = None;
    let mut macro_open: Option<usize> = None;

    for (i, (token, span)) in tokens.iter().enumerate() {
        match token {
            Token::Newline => {
                link_open = None;
                macro_open = None;
            }
            Token::LinkOpen if link_open.is_none() => link_open = Some(span.start),
            Token::LinkClose => {
                if let Some(start) = link_open.take() {
                    markup.links.push(LinkSpan {
                        outer: start..span.end,
                        inner: start + 2..span.start,
                    });
                }
            }
            Token::MacroOpen if macro_open.is_none() => {
                macro_open = Some(span.start);
                if link_open.is_none() {
                    if let Some(choice) = choice_at(source, &tokens[i..]) {
                        markup.choices.push(choice);
                    }
                }
            }
            Token::MacroClose => {
                if let Some(start) = macro_open.take() {
                    markup.macros.push(MacroSpan {
                        outer: start..span.end,
                        body: start + 2..span.start,
                    });
                }
            }
            _ => {}
        }
    }

    markup
}

/// Recognise `<<`, a choice body, and `>>` at the head of `tokens`.
fn choice_at(source: &str, tokens: &[(Token, Range<usize>)]) -> Option<ChoiceSpan> {
    match tokens {
        [(Token::MacroOpen, open), (Token::Text, body), (Token::MacroClose, close), ..] => {
            let target = choice_target(&source[body.clone()])?;
            Some(ChoiceSpan {
                outer: open.start..close.end,
                target: body.start + target.start..body.start + target.end,
            })
        }
        _ => None,
    }
}

/// Parse ` ?choice ?"target" ?` and return the target's range within `body`.
fn choice_target(body: &str) -> Option<Range<usize>> {
    let lead = usize::from(body.starts_with(' '));
    let rest = body[lead..].strip_prefix("choice")?;
    let mut start = body.len() - rest.len();
    if body[start..].starts_with(' ') {
        start += 1;
    }
    let mut end = body.len();
    if body[..end].ends_with(' ') {
        end -= 1;
    }
    let quoted = body.get(start..end)?;
    if quoted.len() < 2 || !quoted.starts_with('"') || !quoted.ends_with('"') {
        return None;
    }
    Some(start + 1..end - 1)
}

// ---------------------------------------------------------------------------
// Bracket balance
// ---------------------------------------------------------------------------

/// The bracket pairs that must balance in a passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// `<<` and `>>`.
    Macro,
    /// `[` and `]`.
    Square,
}

impl PairKind {
    /// The opening delimiter.
    pub fn open(self) -> &'static str {
        match self {
            PairKind::Macro => "<<",
            PairKind::Square => "[",
        }
    }

    /// The closing delimiter.
    pub fn close(self) -> &'static str {
        match self {
            PairKind::Macro => ">>",
            PairKind::Square => "]",
        }
    }
}

/// Why a passage failed the balance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImbalanceKind {
    /// An opener was never closed.
    Unclosed(PairKind),
    /// A closer appeared with nothing open.
    Unexpected(PairKind),
    /// A closer does not match the innermost opener.
    Mismatched {
        /// The innermost open pair.
        open: PairKind,
        /// The closer that was found.
        close: PairKind,
    },
}

/// The first bracket imbalance in a passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imbalance {
    /// Byte range of the offending delimiter.
    pub span: Range<usize>,
    /// What went wrong.
    pub kind: ImbalanceKind,
}

impl fmt::Display for Imbalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ImbalanceKind::Unclosed(kind) => write!(f, "unclosed `{}`", kind.open()),
            ImbalanceKind::Unexpected(kind) => {
                write!(f, "`{}` without matching `{}`", kind.close(), kind.open())
            }
            ImbalanceKind::Mismatched { open, close } => write!(
                f,
                "`{}` closes `{}`, expected `{}`",
                close.close(),
                open.open(),
                open.close()
            ),
        }
    }
}

/// Check that macro and square brackets are mutually balanced over `source`.
pub fn check_balance(source: &str) -> Result<(), Imbalance> {
    let mut stack: Vec<(PairKind, Range<usize>)> = Vec::new();

    for (token, span) in lex(source) {
        let (kind, opening, count) = match token {
            Token::LinkOpen => (PairKind::Square, true, 2),
            Token::LinkClose => (PairKind::Square, false, 2),
            Token::LBracket => (PairKind::Square, true, 1),
            Token::RBracket => (PairKind::Square, false, 1),
            Token::MacroOpen => (PairKind::Macro, true, 1),
            Token::MacroClose => (PairKind::Macro, false, 1),
            _ => continue,
        };

        for n in 0..count {
            let unit = if count == 2 {
                span.start + n..span.start + n + 1
            } else {
                span.clone()
            };
            if opening {
                stack.push((kind, unit));
                continue;
            }
            match stack.pop() {
                Some((open, _)) if open == kind => {}
                Some((open, _)) => {
                    return Err(Imbalance {
                        span: unit,
                        kind: ImbalanceKind::Mismatched { open, close: kind },
                    });
                }
                None => {
                    return Err(Imbalance {
                        span: unit,
                        kind: ImbalanceKind::Unexpected(kind),
                    });
                }
            }
        }
    }

    match stack.pop() {
        Some((kind, span)) => Err(Imbalance {
            span,
            kind: ImbalanceKind::Unclosed(kind),
        }),
        None => Ok(()),
    }
}
