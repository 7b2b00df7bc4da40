//! Token-bounded, section-aware document chunking.
//!
//! Documents are normalized, split into paragraphs, and greedily packed
//! into chunks under a token budget. When a chunk closes, the tail of its
//! paragraphs is carried into the next chunk as overlap so retrieval never
//! loses context at a boundary. Paragraphs that alone exceed the budget are
//! split at sentence boundaries (and, failing that, word boundaries) with
//! the same greedy/overlap logic before entering the stream.
//!
//! Token counts use the cl100k_base vocabulary.

use crate::rag::chunk::TextChunk;
use tiktoken_rs::CoreBPE;

/// Splits raw document text into ordered [`TextChunk`]s.
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    bpe: CoreBPE,
}

/// A paragraph-sized unit entering the greedy packer.
struct Piece {
    text: String,
    start: usize,
    end: usize,
    tokens: usize,
}

impl Chunker {
    /// Create a chunker with a target chunk size and overlap budget, both in
    /// tokens.
    ///
    /// # Panics
    /// Panics if `chunk_overlap >= chunk_size` or `chunk_size == 0`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert!(
            chunk_overlap < chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        Self {
            chunk_size,
            chunk_overlap,
            // Vocabulary data is embedded in the binary; construction cannot
            // fail outside of memory exhaustion.
            bpe: tiktoken_rs::cl100k_base().expect("embedded cl100k_base vocabulary"),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Number of cl100k tokens in `text`.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Split a document into ordered chunks.
    ///
    /// Empty or whitespace-only input yields no chunks; a document under the
    /// chunk size yields exactly one. Chunk indices are reassigned
    /// sequentially at the end and are always contiguous from 0.
    pub fn chunk(&self, content: &str) -> Vec<TextChunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let normalized = normalize(content);
        let paragraphs = self.split_paragraphs(&normalized);

        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut parts: Vec<Piece> = Vec::new();
        let mut part_tokens = 0usize;
        let mut section: Option<String> = None;

        for para in paragraphs {
            // Oversized paragraphs are pre-split so the packer only ever
            // sees pieces that fit the budget.
            for piece in self.fit_pieces(para) {
                if part_tokens + piece.tokens > self.chunk_size && !parts.is_empty() {
                    chunks.push(self.close_chunk(&parts, part_tokens, section.clone()));

                    let (overlap, overlap_tokens) = self.carry_overlap(&mut parts);
                    parts = overlap;
                    part_tokens = overlap_tokens;
                }

                if let Some(title) = extract_section_title(&piece.text) {
                    section = Some(title);
                }

                part_tokens += piece.tokens;
                parts.push(piece);
            }
        }

        if !parts.is_empty() {
            chunks.push(self.close_chunk(&parts, part_tokens, section));
        }

        // Reindex so indices are contiguous from 0
        for (i, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_index = i;
        }

        chunks
    }

    fn close_chunk(&self, parts: &[Piece], tokens: usize, section: Option<String>) -> TextChunk {
        let content = parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let start = parts.first().map(|p| p.start).unwrap_or(0);
        let end = parts.last().map(|p| p.end).unwrap_or(0);

        let mut chunk = TextChunk::new(content, 0, tokens).with_span(start, end);
        if let Some(title) = section {
            chunk = chunk.with_section(title);
        }
        chunk
    }

    /// Walk backward through the closed chunk's pieces, keeping up to the
    /// overlap budget of tokens for the next chunk's head.
    fn carry_overlap(&self, parts: &mut Vec<Piece>) -> (Vec<Piece>, usize) {
        if self.chunk_overlap == 0 {
            return (Vec::new(), 0);
        }

        let mut kept: Vec<Piece> = Vec::new();
        let mut total = 0usize;
        while let Some(piece) = parts.pop() {
            if total + piece.tokens > self.chunk_overlap {
                break;
            }
            total += piece.tokens;
            kept.push(piece);
        }
        kept.reverse();
        (kept, total)
    }

    /// Turn one paragraph into packer-sized pieces, splitting oversized ones
    /// at sentence (then word) boundaries.
    fn fit_pieces(&self, para: Piece) -> Vec<Piece> {
        if para.tokens <= self.chunk_size {
            return vec![para];
        }

        let sentences = split_sentences(&para.text);
        let units = if sentences.len() > 1 {
            sentences
        } else {
            // A single unbreakable sentence: fall back to word windows
            split_words(&para.text, self.chunk_size, &|t| self.count_tokens(t))
        };

        let mut pieces = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_tokens = 0usize;

        for unit in units {
            let unit_tokens = self.count_tokens(&unit);

            // A sentence that alone exceeds the budget is word-split into
            // standalone pieces, flushing whatever was accumulated first.
            if unit_tokens > self.chunk_size {
                if !current.is_empty() {
                    pieces.push(Piece {
                        text: current.join(" "),
                        start: para.start,
                        end: para.end,
                        tokens: current_tokens,
                    });
                    current = Vec::new();
                    current_tokens = 0;
                }
                for window in split_words(&unit, self.chunk_size, &|t| self.count_tokens(t)) {
                    let tokens = self.count_tokens(&window);
                    pieces.push(Piece {
                        text: window,
                        start: para.start,
                        end: para.end,
                        tokens,
                    });
                }
                continue;
            }

            if current_tokens + unit_tokens > self.chunk_size && !current.is_empty() {
                pieces.push(Piece {
                    text: current.join(" "),
                    start: para.start,
                    end: para.end,
                    tokens: current_tokens,
                });

                // Same backward-walk overlap as at the chunk level
                let mut overlap: Vec<String> = Vec::new();
                let mut overlap_tokens = 0usize;
                for prev in current.iter().rev() {
                    let prev_tokens = self.count_tokens(prev);
                    if overlap_tokens + prev_tokens > self.chunk_overlap {
                        break;
                    }
                    overlap_tokens += prev_tokens;
                    overlap.insert(0, prev.clone());
                }
                current = overlap;
                current_tokens = overlap_tokens;
            }
            current_tokens += unit_tokens;
            current.push(unit);
        }

        if !current.is_empty() {
            pieces.push(Piece {
                text: current.join(" "),
                start: para.start,
                end: para.end,
                tokens: current_tokens,
            });
        }

        pieces
    }

    /// Split normalized content into trimmed paragraphs with char spans.
    fn split_paragraphs(&self, content: &str) -> Vec<Piece> {
        let mut paragraphs = Vec::new();
        let mut pos = 0usize;

        for raw in content.split("\n\n") {
            let start_offset = raw.len() - raw.trim_start().len();
            let text = raw.trim();
            if !text.is_empty() {
                paragraphs.push(Piece {
                    text: text.to_string(),
                    start: pos + start_offset,
                    end: pos + start_offset + text.len(),
                    tokens: self.count_tokens(text),
                });
            }
            pos += raw.len() + 2;
        }

        paragraphs
    }
}

/// Collapse repeated blank lines and space runs, strip trailing whitespace
/// per line.
fn normalize(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;

    for line in content.lines() {
        let stripped = collapse_spaces(line.trim_end());
        if stripped.is_empty() {
            blank_run += 1;
            // At most one blank line between paragraphs
            if blank_run == 1 && !lines.is_empty() {
                lines.push(String::new());
            }
        } else {
            blank_run = 0;
            lines.push(stripped);
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Collapse runs of two or more spaces into one.
fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_space = false;
    for c in line.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            prev_space = false;
            out.push(c);
        }
    }
    out
}

/// Extract a section title when the piece's first line is heading-like:
/// markdown `#` headings or `1.`/`2.3.`-style numbered sections.
fn extract_section_title(text: &str) -> Option<String> {
    let first_line = text.lines().next()?.trim();

    if first_line.starts_with('#') {
        let title = first_line.trim_start_matches('#').trim();
        return (!title.is_empty()).then(|| title.to_string());
    }

    numbered_section_title(first_line)
}

/// Match `(\d+\.)+\s+title` without pulling in a regex engine.
fn numbered_section_title(line: &str) -> Option<String> {
    let mut rest = line;
    let mut matched_any = false;

    loop {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 || !rest[digits..].starts_with('.') {
            break;
        }
        rest = &rest[digits + 1..];
        matched_any = true;
    }

    if !matched_any || !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Split on sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Last-resort split of an unbreakable sentence into word windows under the
/// token budget.
fn split_words(text: &str, budget: usize, count: &dyn Fn(&str) -> usize) -> Vec<String> {
    let mut windows = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if count(&current.join(" ")) > budget && current.len() > 1 {
            let overflow = current.pop();
            windows.push(current.join(" "));
            current = overflow.into_iter().collect();
        }
    }
    if !current.is_empty() {
        windows.push(current.join(" "));
    }
    windows
}
