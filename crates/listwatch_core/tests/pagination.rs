use listwatch_core::{paginate, Chunk};
use pretty_assertions::assert_eq;

fn lines(lens: &[usize]) -> Vec<String> {
    lens.iter()
        .enumerate()
        .map(|(i, len)| {
            let c = char::from(b'a' + (i % 26) as u8);
            std::iter::repeat(c).take(*len).collect()
        })
        .collect()
}

fn flatten(chunks: &[Chunk]) -> Vec<String> {
    chunks.iter().flat_map(|c| c.lines().to_vec()).collect()
}

#[test]
fn header_only_input_yields_one_chunk() {
    let chunks: Vec<_> = paginate(vec!["<b>Threads 2017 June</b>".to_string()], 100).collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text(), "<b>Threads 2017 June</b>");
}

#[test]
fn order_preserved_and_limits_respected() {
    let max = 50;
    let shapes: [&[usize]; 5] = [
        &[10, 10, 10, 10, 10, 10],
        &[49, 1, 50, 0, 3],
        &[25, 24, 25, 24],
        &[1; 60],
        &[7, 13, 29, 41, 2, 2, 2, 48],
    ];
    for shape in shapes {
        let input = lines(shape);
        let chunks: Vec<_> = paginate(input.clone(), max).collect();
        assert_eq!(flatten(&chunks), input);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert!(chunk.size() <= max, "chunk of {} exceeds {max}", chunk.size());
            assert_eq!(chunk.size(), chunk.text().chars().count());
        }
    }
}

#[test]
fn oversized_line_is_emitted_alone() {
    let input = lines(&[5, 120, 5]);
    let chunks: Vec<_> = paginate(input.clone(), 50).collect();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1].lines(), &input[1..2]);
    assert_eq!(chunks[1].size(), 120);
    assert_eq!(flatten(&chunks), input);
}

#[test]
fn greedy_packing_fills_chunks_before_opening_new_ones() {
    // 20 + 1 + 20 = 41 fits; adding another 20 would need 62.
    let chunks: Vec<_> = paginate(lines(&[20, 20, 20, 20, 20]), 45).collect();
    let sizes: Vec<_> = chunks.iter().map(|c| c.lines().len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[test]
fn sizes_are_counted_in_characters() {
    let input = vec!["è".repeat(10), "è".repeat(10)];
    let chunks: Vec<_> = paginate(input, 21).collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].size(), 21);
}
