//! Recover a legal SAN move from free-form model output.
//!
//! The scanner walks the reply looking for substrings shaped like algebraic
//! moves: castling (tolerating the common `0` homoglyph for `O`), piece
//! moves with optional disambiguation/capture/promotion/check markers, and
//! bare pawn squares. A `MOVE:` prefix never matches the grammar, so the
//! scanner simply skips over it. Candidates are normalized (`0` → `O`) and
//! filtered against the legal set in order of appearance; the last survivor
//! wins, on the assumption that later text is the model's corrected answer.

use std::collections::HashSet;

/// Extract the most likely intended legal move from `content`.
///
/// `legal_moves` must hold normalized SAN strings. Returns None when
/// nothing in the reply resolves to a legal move.
pub fn extract_move(content: &str, legal_moves: &HashSet<String>) -> Option<String> {
    let mut found = None;
    for candidate in scan_candidates(content) {
        let normalized = candidate.replace('0', "O");
        if legal_moves.contains(&normalized) {
            found = Some(normalized);
        }
    }
    if found.is_some() {
        return found;
    }

    // Fallback: any whitespace token that is exactly a legal move
    content
        .split_whitespace()
        .map(|token| token.replace('0', "O"))
        .find(|token| legal_moves.contains(token))
}

fn scan_candidates(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let mut candidates = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if let Some(len) = match_candidate(&chars[i..]) {
            candidates.push(chars[i..i + len].iter().collect());
            i += len;
        } else {
            i += 1;
        }
    }
    candidates
}

fn match_candidate(s: &[char]) -> Option<usize> {
    match_castling(s).or_else(|| match_piece_move(s))
}

fn match_castling(s: &[char]) -> Option<usize> {
    let is_o = |c: char| c == 'O' || c == '0';
    // Long castling first, so O-O-O is not truncated to O-O
    if s.len() >= 5 && is_o(s[0]) && s[1] == '-' && is_o(s[2]) && s[3] == '-' && is_o(s[4]) {
        return Some(5);
    }
    if s.len() >= 3 && is_o(s[0]) && s[1] == '-' && is_o(s[2]) {
        return Some(3);
    }
    None
}

/// Match `[KQRBN]? [a-h]? [1-8]? x? [a-h][1-8] (=[QRBN])? [+#]?`,
/// preferring the longest consumption of the optional fields.
fn match_piece_move(s: &[char]) -> Option<usize> {
    let start = usize::from(matches!(s.first(), Some('K' | 'Q' | 'R' | 'B' | 'N')));

    for take_file in [true, false] {
        for take_rank in [true, false] {
            for take_capture in [true, false] {
                let mut j = start;
                if take_file {
                    if j < s.len() && is_file(s[j]) {
                        j += 1;
                    } else {
                        continue;
                    }
                }
                if take_rank {
                    if j < s.len() && is_rank(s[j]) {
                        j += 1;
                    } else {
                        continue;
                    }
                }
                if take_capture {
                    if j < s.len() && s[j] == 'x' {
                        j += 1;
                    } else {
                        continue;
                    }
                }
                if j + 1 < s.len() && is_file(s[j]) && is_rank(s[j + 1]) {
                    let mut end = j + 2;
                    if end + 1 < s.len()
                        && s[end] == '='
                        && matches!(s[end + 1], 'Q' | 'R' | 'B' | 'N')
                    {
                        end += 2;
                    }
                    if end < s.len() && matches!(s[end], '+' | '#') {
                        end += 1;
                    }
                    return Some(end);
                }
            }
        }
    }
    None
}

fn is_file(c: char) -> bool {
    ('a'..='h').contains(&c)
}

fn is_rank(c: char) -> bool {
    ('1'..='8').contains(&c)
}
