use serde::{Deserialize, Serialize};
use crate::slot::Intersection;

/// Points every placed word is worth on its own.
pub const WORD_BONUS: i32 = 10;

/// Points for crossing two words on the letter.
///
/// ## Examples
/// ```
/// # use crozzle_generator::scoring::letter_score;
/// assert_eq!(letter_score(b'A'), 2);
/// assert_eq!(letter_score(b'M'), 8);
/// assert_eq!(letter_score(b'Z'), 64);
/// ```
pub fn letter_score(letter: u8) -> i32
{
    match letter.to_ascii_uppercase()
    {
        b'A'..=b'F' => 2,
        b'G'..=b'L' => 4,
        b'M'..=b'R' => 8,
        b'S'..=b'X' => 16,
        b'Y' => 32,
        b'Z' => 64,
        _ => 0,
    }
}

/// One scored intersection of the report
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct IntersectionScore
{
    pub intersection: Intersection,
    pub letter: char,
    pub score: i32,
    pub running_total: i32,
}

/// Plain text summary of where the score of a workspace comes from
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ScoreBreakdown
{
    pub words: Vec<String>,
    pub intersections: Vec<IntersectionScore>,
    pub intersection_score: i32,
    pub total: i32,
}

impl ScoreBreakdown
{
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>, intersections: impl IntoIterator<Item = &'a Intersection>) -> ScoreBreakdown
    {
        let words: Vec<String> = words.into_iter().map(str::to_owned).collect();

        let mut running_total = 0;
        let intersections: Vec<IntersectionScore> = intersections.into_iter()
            .map(|intersection|
            {
                let letter = intersection.letter();
                let score = letter_score(letter);
                running_total += score;
                IntersectionScore { intersection: intersection.clone(), letter: char::from(letter), score, running_total }
            })
            .collect();

        let total = words.len() as i32 * WORD_BONUS + running_total;
        ScoreBreakdown { words, intersections, intersection_score: running_total, total }
    }
}

impl std::fmt::Display for ScoreBreakdown
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        writeln!(f, "Words ({}):", self.words.len())?;
        for word in self.words.iter()
        {
            writeln!(f, "  {word}")?;
        }
        writeln!(f, "Intersections ({}):", self.intersections.len())?;
        for score in self.intersections.iter()
        {
            writeln!(f, "  {} {} = {} (total {})", score.intersection, score.letter, score.score, score.running_total)?;
        }
        writeln!(f, "Score: {}*{} + {} = {}", self.words.len(), WORD_BONUS, self.intersection_score, self.total)
    }
}
