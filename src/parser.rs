//! Tokenizer for a single line of Marlin G-code.
//!
//! The ebnf representation following [https://bottlecaps.de/rr/ui]'s syntax
//! ```ebnf
//! line    ::= ' '* ( code ( ' '+ word )* )? ' '* ( ';' [^\n]* )?
//! code    ::= [^ ;]+
//! word    ::= [a-zA-Z] number
//! number  ::= '-'? ( [0-9]+ ( '.' [0-9]* )? | '.' [0-9]+ )
//! ```
//!
//! The comment is everything after the first `;`, kept verbatim. Arguments are only
//! tokenized on demand, so lines carrying free text (`M117 Printing...`) can still be
//! split and carried around untouched.
mod inline;
mod values;

use std::collections::BTreeMap;

use crate::InvalidGCode;

pub use inline::InlineArguments;
pub(crate) use values::parse_number;

/// One line split into its code, its raw argument text and its trailing comment.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Line<'a> {
    text: &'a str,
    code: Option<&'a str>,
    arguments: &'a str,
    comment: Option<&'a str>,
}

impl<'a> Line<'a> {
    /// `text` must not contain a newline.
    pub fn split(text: &'a str) -> Self {
        let (body, comment) = match text.find(';') {
            Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
            None => (text, None),
        };
        let body = body.trim_start();
        let (code, arguments) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };
        Self {
            text,
            code: (!code.is_empty()).then_some(code),
            arguments,
            comment,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn code(&self) -> Option<&'a str> {
        self.code
    }

    pub fn comment(&self) -> Option<&'a str> {
        self.comment
    }

    /// Blank or comment-only.
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
    }

    /// Whether the code is `letter` followed by `number`, so `g1` and `G01` both are `G1`.
    pub fn code_is(&self, letter: char, number: u32) -> bool {
        let Some(code) = self.code else {
            return false;
        };
        let mut chars = code.chars();
        match chars.next() {
            Some(c) if c.eq_ignore_ascii_case(&letter) => {}
            _ => return false,
        }
        let digits = chars.as_str();
        !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits.parse::<u32>() == Ok(number)
    }

    pub fn words(&self) -> Words<'a> {
        Words {
            tokens: self.arguments.split_whitespace(),
        }
    }

    /// General purpose letter to value map.
    pub fn arguments(&self) -> Result<Arguments, InvalidGCode> {
        let mut map = BTreeMap::new();
        for word in self.words() {
            let Word { letter, value } = word?;
            if map.insert(letter, value).is_some() {
                return Err(InvalidGCode::DuplicateArgument(letter));
            }
        }
        Ok(Arguments(map))
    }

    /// Allocation free letter to value map holding at most `N` arguments.
    pub fn inline_arguments<const N: usize>(&self) -> Result<InlineArguments<N>, InvalidGCode> {
        let mut args = InlineArguments::new();
        for word in self.words() {
            let Word { letter, value } = word?;
            args.insert(letter, value)?;
        }
        Ok(args)
    }

    /// Letters given on the line, each optionally followed by a value that is ignored.
    pub fn flags(&self) -> Result<Flags, InvalidGCode> {
        let mut flags = Flags::default();
        for token in self.arguments.split_whitespace() {
            let (letter, rest) = split_letter(token)?;
            if !rest.is_empty() && parse_number(rest).is_none() {
                return Err(InvalidGCode::MalformedArgument(token.to_owned()));
            }
            if !flags.insert(letter) {
                return Err(InvalidGCode::DuplicateArgument(letter));
            }
        }
        Ok(flags)
    }
}

fn split_letter(token: &str) -> Result<(char, &str), InvalidGCode> {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => Ok((c.to_ascii_uppercase(), chars.as_str())),
        _ => Err(InvalidGCode::MalformedArgument(token.to_owned())),
    }
}

/// A letter and its numeric value. Letters are always upper case.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

/// Iterator over the arguments of a [`Line`].
#[derive(Debug, Clone)]
pub struct Words<'a> {
    tokens: core::str::SplitWhitespace<'a>,
}

impl Iterator for Words<'_> {
    type Item = Result<Word, InvalidGCode>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.next()?;
        Some(split_letter(token).and_then(|(letter, rest)| {
            parse_number(rest)
                .map(|value| Word { letter, value })
                .ok_or_else(|| InvalidGCode::MalformedArgument(token.to_owned()))
        }))
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Arguments(BTreeMap<char, f64>);

impl Arguments {
    pub fn get(&self, letter: char) -> Option<f64> {
        self.0.get(&letter.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, letter: char) -> bool {
        self.0.contains_key(&letter.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Letters in alphabetical order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.0.keys().copied()
    }

    /// Fails on the first letter not listed in `allowed`.
    pub fn only(&self, allowed: &str) -> Result<(), InvalidGCode> {
        match self.letters().find(|l| !allowed.contains(*l)) {
            Some(letter) => Err(InvalidGCode::UnexpectedArgument(letter)),
            None => Ok(()),
        }
    }
}

/// A set of argument letters.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Flags(u32);

impl Flags {
    fn bit(letter: char) -> Option<u32> {
        letter
            .is_ascii_alphabetic()
            .then(|| 1 << (letter.to_ascii_uppercase() as u32 - 'A' as u32))
    }

    /// Returns `false` if the letter was already present.
    pub fn insert(&mut self, letter: char) -> bool {
        let Some(bit) = Self::bit(letter) else {
            return false;
        };
        let fresh = self.0 & bit == 0;
        self.0 |= bit;
        fresh
    }

    pub fn contains(&self, letter: char) -> bool {
        Self::bit(letter).is_some_and(|bit| self.0 & bit != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}
