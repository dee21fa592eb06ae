//! Greedy packing of lines into message-sized chunks.

/// Characters added between two lines of a chunk.
pub const SEPARATOR: &str = "\n";

/// An ordered group of whole lines delivered as one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    lines: Vec<String>,
    size: usize,
}

impl Chunk {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Rendered length in characters, separators included.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join(SEPARATOR)
    }

    fn size_with(&self, line_len: usize) -> usize {
        if self.lines.is_empty() {
            line_len
        } else {
            self.size + SEPARATOR.len() + line_len
        }
    }

    fn push(&mut self, line: String, line_len: usize) {
        self.size = self.size_with(line_len);
        self.lines.push(line);
    }
}

/// Lazily yields chunks of at most `max_chunk_size` characters.
///
/// A line longer than the limit on its own gets a chunk to itself. Empty
/// input still yields one empty chunk.
#[derive(Debug)]
pub struct Pages<I> {
    lines: I,
    max_chunk_size: usize,
    carry: Option<(String, usize)>,
    emitted: bool,
}

impl<I: Iterator<Item = String>> Iterator for Pages<I> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let mut chunk = Chunk::default();
        loop {
            let next = self.carry.take().or_else(|| {
                self.lines.next().map(|line| {
                    let len = line.chars().count();
                    (line, len)
                })
            });
            let Some((line, len)) = next else {
                break;
            };
            if !chunk.is_empty() && chunk.size_with(len) > self.max_chunk_size {
                self.carry = Some((line, len));
                break;
            }
            chunk.push(line, len);
        }

        if chunk.is_empty() && self.emitted {
            return None;
        }
        self.emitted = true;
        Some(chunk)
    }
}

pub fn paginate<I>(lines: I, max_chunk_size: usize) -> Pages<I::IntoIter>
where
    I: IntoIterator<Item = String>,
{
    Pages {
        lines: lines.into_iter(),
        max_chunk_size,
        carry: None,
        emitted: false,
    }
}
