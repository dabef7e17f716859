//! A whitespace/punctuation sentence segmenter with no ML dependency
//! (spec.md §4.7 step 1). Guards a short list of abbreviations so "Dr.
//! Smith" and "et al." don't split mid-sentence.

const ABBREVIATIONS: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "fig", "no", "vs", "approx", "et al", "e.g", "i.e", "inc", "ltd"];

pub fn segment_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        current.push(c);

        if c == '.' || c == '!' || c == '?' {
            let boundary = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
            if boundary && !ends_with_abbreviation(&current) {
                let next_non_space = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                let followed_by_lowercase = next_non_space.map(|c| c.is_lowercase()).unwrap_or(false);
                if !followed_by_lowercase {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        sentences.push(trimmed.to_string());
                    }
                    current.clear();
                }
            }
        }
        i += 1;
    }

    let trailing = current.trim();
    if !trailing.is_empty() {
        sentences.push(trailing.to_string());
    }
    sentences
}

fn ends_with_abbreviation(current: &str) -> bool {
    let lower = current.to_lowercase();
    let trimmed = lower.trim_end_matches('.').trim();
    let last_word = trimmed.rsplit(|c: char| c.is_whitespace()).next().unwrap_or("");
    ABBREVIATIONS.contains(&last_word)
}
