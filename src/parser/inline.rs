use crate::InvalidGCode;

/// A letter to value map stored inline, for the instructions that are parsed by the
/// million (linear moves). Lookups are linear, which beats hashing at this size.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct InlineArguments<const N: usize> {
    letters: [char; N],
    values: [f64; N],
    len: usize,
}

impl<const N: usize> Default for InlineArguments<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> InlineArguments<N> {
    pub fn new() -> Self {
        Self {
            letters: ['\0'; N],
            values: [0.; N],
            len: 0,
        }
    }

    pub fn insert(&mut self, letter: char, value: f64) -> Result<(), InvalidGCode> {
        let letter = letter.to_ascii_uppercase();
        if self.get(letter).is_some() {
            return Err(InvalidGCode::DuplicateArgument(letter));
        }
        if self.len == N {
            return Err(InvalidGCode::Unsupported("too many arguments"));
        }
        self.letters[self.len] = letter;
        self.values[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.letters[..self.len]
            .iter()
            .position(|l| *l == letter)
            .map(|idx| self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.letters[..self.len]
            .iter()
            .copied()
            .zip(self.values[..self.len].iter().copied())
    }
}
