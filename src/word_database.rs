use std::{collections::HashMap, hash::{Hash, Hasher}, sync::Arc};

use fixedbitset::FixedBitSet;

/// Keeps only ascii letters of the word, uppercased.
///
/// ## Examples
/// ```
/// # use crozzle_generator::word_database::sanitize_word;
/// assert_eq!(sanitize_word(" Don't-Stop 2 "), "DONTSTOP");
/// ```
pub fn sanitize_word(word: &str) -> String
{
    word.chars().filter(char::is_ascii_alphabetic).map(|c| c.to_ascii_uppercase()).collect()
}

/// Splits the text into lines and sanitizes each of them, lines without letters are dropped.
pub fn words_from_text(text: &str) -> Vec<String>
{
    text.lines().map(sanitize_word).filter(|w| !w.is_empty()).collect()
}

/// The part of a database that never changes once built, shared by every database derived from it.
#[derive(Debug)]
struct WordIndex
{
    words: Vec<Arc<str>>,
    /// Every substring of every distinct word, mapped to `(word index, offset of the substring)`.
    lookup: HashMap<Vec<u8>, Vec<(usize, usize)>>,
    /// Indices of all entries with the same text, the first one is the canonical one.
    by_text: HashMap<Arc<str>, Vec<usize>>,
}

/// # Represents the words still available for placing
///
/// The word list and the fragment lookup are built once and shared between all databases derived with
/// [WordDatabase::remove], only the availability bits are copied.
///
/// Two databases are equal when their availability bits are equal.
///
/// # Example
///
/// ```
/// # use crozzle_generator::word_database::WordDatabase;
/// let db = WordDatabase::new(["apple", "maple", "pear"]);
/// let fewer = db.remove("MAPLE");
///
/// assert_eq!(db.list_available_matching_words(b"PLE").count(), 2);
/// assert_eq!(fewer.list_available_matching_words(b"PLE").count(), 1);
/// assert!(!fewer.can_match_word(b"MAP"));
/// ```
#[derive(Clone, Debug)]
pub struct WordDatabase
{
    index: Arc<WordIndex>,
    available: FixedBitSet,
}

impl WordDatabase
{
    /// Builds a database from a word list, words are [sanitized](sanitize_word) and words shorter than two letters dropped.
    ///
    /// Duplicates stay as separate entries, but they are used up together.
    pub fn new<S: AsRef<str>>(words: impl IntoIterator<Item = S>) -> WordDatabase
    {
        let words: Vec<Arc<str>> = words.into_iter()
            .map(|w| sanitize_word(w.as_ref()))
            .filter(|w| w.len() > 1)
            .map(Arc::from)
            .collect();

        let mut by_text: HashMap<Arc<str>, Vec<usize>> = HashMap::new();
        for (i, word) in words.iter().enumerate()
        {
            by_text.entry(word.clone()).or_default().push(i);
        }

        let mut lookup: HashMap<Vec<u8>, Vec<(usize, usize)>> = HashMap::new();
        for (i, word) in words.iter().enumerate()
        {
            if by_text[word][0] != i { continue; }

            let letters = word.as_bytes();
            for start in 0..letters.len()
            {
                for end in start + 1..=letters.len()
                {
                    lookup.entry(letters[start..end].to_vec()).or_default().push((i, start));
                }
            }
        }

        let mut available = FixedBitSet::with_capacity(words.len());
        available.insert_range(..);

        WordDatabase { index: Arc::new(WordIndex { words, lookup, by_text }), available }
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize
    {
        self.index.words.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.index.words.is_empty()
    }

    /// Number of entries not used yet.
    pub fn available_count(&self) -> usize
    {
        self.available.count_ones(..)
    }

    pub fn is_available(&self, word: &str) -> bool
    {
        self.index.by_text.get(word).is_some_and(|indices| self.available.contains(indices[0]))
    }

    /// Returns the shared text of the word, if the database knows it.
    pub fn word(&self, word: &str) -> Option<&Arc<str>>
    {
        self.index.by_text.get(word).map(|indices| &self.index.words[indices[0]])
    }

    /// Returns a database with every entry of the word marked as used.
    pub fn remove(&self, word: &str) -> WordDatabase
    {
        let mut available = self.available.clone();
        if let Some(indices) = self.index.by_text.get(word)
        {
            for &i in indices
            {
                available.set(i, false);
            }
        }
        WordDatabase { index: self.index.clone(), available }
    }

    /// Iterates over distinct words still available.
    pub fn available_words(&self) -> impl Iterator<Item = &Arc<str>> + '_
    {
        self.available.ones()
            .filter(|&i| self.index.by_text[&self.index.words[i]][0] == i)
            .map(|i| &self.index.words[i])
    }

    /// Iterates over `(word, offset)` of every available word containing the fragment, one item per occurrence.
    pub fn list_available_matching_words<'a>(&'a self, fragment: &[u8]) -> impl Iterator<Item = (&'a Arc<str>, usize)> + 'a
    {
        self.index.lookup.get(fragment)
            .into_iter()
            .flatten()
            .filter(|(i, _)| self.available.contains(*i))
            .map(|&(i, offset)| (&self.index.words[i], offset))
    }

    /// Number of occurrences of the fragment in available words, without allocating.
    pub fn count_matching_words(&self, fragment: &[u8]) -> usize
    {
        self.list_available_matching_words(fragment).count()
    }

    /// Checks if at least one available word contains the fragment.
    pub fn can_match_word(&self, fragment: &[u8]) -> bool
    {
        self.list_available_matching_words(fragment).next().is_some()
    }
}

impl PartialEq for WordDatabase
{
    fn eq(&self, other: &Self) -> bool
    {
        self.available == other.available
    }
}

impl Eq for WordDatabase {}

impl Hash for WordDatabase
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.available.hash(state);
    }
}
