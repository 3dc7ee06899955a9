use std::{fmt, io::Write};

use crate::genome::Chromosomes;

/// How a raw frequency count is rendered in the track outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Emit the count unchanged.
    Frequency,
    /// Emit the reciprocal of the count. A count of zero marks a
    /// position with no defined k-mer and stays zero rather than being
    /// inverted.
    Mappability,
}

impl Transform {
    pub fn apply(&self, v: u16) -> Value {
        match self {
            Self::Frequency => Value::Count(v),
            Self::Mappability => Value::Score(if v != 0 { 1.0 / (v as f32) } else { 0.0 }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Count(u16),
    Score(f32),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(v) => write!(f, "{}", v),
            Self::Score(x) => write!(f, "{}", x),
        }
    }
}

/// Run length scan over one chromosome span: yields (offset of the run
/// within the span, run length, value). Runs are never empty — a newly
/// seen value always starts with an occurrence count of one, also when
/// the span ends exactly at a run boundary.
struct Runs<'a> {
    span: &'a [u16],
    pos: usize,
}

impl<'a> Iterator for Runs<'a> {
    type Item = (usize, usize, u16);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let val = *self.span.get(start)?;
        let mut pos = start + 1;
        while self.span.get(pos) == Some(&val) {
            pos += 1
        }
        self.pos = pos;
        Some((start, pos - start, val))
    }
}

fn runs(span: &[u16]) -> Runs {
    Runs { span, pos: 0 }
}

/// Plain text dump: per chromosome a `>` name header, then all values
/// of its span space separated on one line (no trailing space).
pub fn write_txt<W: Write>(
    w: &mut W,
    counts: &[u16],
    chroms: &Chromosomes,
    transform: Transform,
) -> anyhow::Result<()> {
    for ix in 0..chroms.len() {
        writeln!(w, ">{}", chroms.name(ix))?;
        let mut sep = "";
        for v in &counts[chroms.span(ix, counts.len())] {
            write!(w, "{}{}", sep, transform.apply(*v))?;
            sep = " ";
        }
        writeln!(w)?;
    }
    Ok(())
}

/// WIG track. Zero valued runs are dropped: a zero count marks a
/// position with no defined k-mer, not a measured value of zero. The
/// `variableStep` header is repeated only when the span differs from
/// the span of the last run actually emitted.
pub fn write_wig<W: Write>(
    w: &mut W,
    counts: &[u16],
    chroms: &Chromosomes,
    transform: Transform,
) -> anyhow::Result<()> {
    for ix in 0..chroms.len() {
        let mut last_len = 0;
        for (start, len, val) in runs(&counts[chroms.span(ix, counts.len())]) {
            if val == 0 {
                continue;
            }
            if len != last_len {
                writeln!(w, "variableStep chrom={} span={}", chroms.name(ix), len)?;
                last_len = len
            }
            // wig positions start at 1
            writeln!(w, "{} {}", start + 1, transform.apply(val))?;
        }
    }
    Ok(())
}

pub fn write_chrom_sizes<W: Write>(w: &mut W, chroms: &Chromosomes) -> anyhow::Result<()> {
    for ix in 0..chroms.len() {
        writeln!(w, "{}\t{}", chroms.name(ix), chroms.length(ix))?;
    }
    Ok(())
}

/// BED / BEDGraph track: zero based half open run intervals, with the
/// same zero run suppression as the WIG output. Plain BED carries a
/// placeholder name column before the value.
pub fn write_bed<W: Write>(
    w: &mut W,
    counts: &[u16],
    chroms: &Chromosomes,
    transform: Transform,
    bedgraph: bool,
) -> anyhow::Result<()> {
    for ix in 0..chroms.len() {
        for (start, len, val) in runs(&counts[chroms.span(ix, counts.len())]) {
            if val == 0 {
                continue;
            }
            write!(w, "{}\t{}\t{}\t", chroms.name(ix), start, start + len)?;
            if !bedgraph {
                write!(w, "-\t")?;
            }
            writeln!(w, "{}", transform.apply(val))?;
        }
    }
    Ok(())
}

mod test {
    #[allow(unused_imports)]
    use super::*;

    #[allow(dead_code)]
    fn table(lengths: &[u64]) -> Chromosomes {
        let v = lengths
            .iter()
            .enumerate()
            .map(|(i, l)| (format!("chr{}", i + 1), *l))
            .collect();
        Chromosomes::new(v).unwrap()
    }

    #[allow(dead_code)]
    fn to_string<F: Fn(&mut Vec<u8>) -> anyhow::Result<()>>(f: F) -> String {
        let mut v = Vec::new();
        f(&mut v).unwrap();
        String::from_utf8(v).unwrap()
    }

    #[test]
    fn wig_mappability_scenario() {
        let counts = [2, 2, 2, 0, 1, 1];
        let chroms = Chromosomes::new(vec![("X".to_owned(), 6)]).unwrap();
        let s = to_string(|w| write_wig(w, &counts, &chroms, Transform::Mappability));
        assert_eq!(
            s,
            "variableStep chrom=X span=3\n1 0.5\nvariableStep chrom=X span=2\n5 1\n"
        );
    }

    #[test]
    fn wig_header_tracks_last_emitted_span() {
        // the suppressed zero run between the two emitted runs must not
        // force a fresh header
        let counts = [1, 1, 0, 0, 2, 2];
        let chroms = table(&[6]);
        let s = to_string(|w| write_wig(w, &counts, &chroms, Transform::Frequency));
        assert_eq!(s, "variableStep chrom=chr1 span=2\n1 1\n5 2\n");
    }

    #[test]
    fn wig_runs_close_at_chromosome_boundary() {
        let counts = [1, 1, 1, 1, 1, 1];
        let chroms = table(&[3, 3]);
        let s = to_string(|w| write_wig(w, &counts, &chroms, Transform::Frequency));
        assert_eq!(
            s,
            "variableStep chrom=chr1 span=3\n1 1\nvariableStep chrom=chr2 span=3\n1 1\n"
        );
    }

    #[test]
    fn wig_empty_span_emits_nothing() {
        let counts = [1, 1];
        let chroms = table(&[2, 4]);
        let s = to_string(|w| write_wig(w, &counts, &chroms, Transform::Frequency));
        assert_eq!(s, "variableStep chrom=chr1 span=2\n1 1\n");
    }

    #[test]
    fn txt_dump() {
        let counts = [2, 4, 0, 3];
        let chroms = table(&[3, 3]);
        let s = to_string(|w| write_txt(w, &counts, &chroms, Transform::Mappability));
        assert_eq!(s, ">chr1\n0.5 0.25 0\n>chr2\n0.33333334\n");
        let s = to_string(|w| write_txt(w, &counts, &chroms, Transform::Frequency));
        assert_eq!(s, ">chr1\n2 4 0\n>chr2\n3\n");
    }

    #[test]
    fn bed_and_bedgraph() {
        let counts = [2, 2, 0, 1];
        let chroms = table(&[4]);
        let s = to_string(|w| write_bed(w, &counts, &chroms, Transform::Frequency, false));
        assert_eq!(s, "chr1\t0\t2\t-\t2\nchr1\t3\t4\t-\t1\n");
        let s = to_string(|w| write_bed(w, &counts, &chroms, Transform::Frequency, true));
        assert_eq!(s, "chr1\t0\t2\t2\nchr1\t3\t4\t1\n");
    }

    #[test]
    fn chrom_sizes() {
        let chroms = table(&[3, 5]);
        let s = to_string(|w| write_chrom_sizes(w, &chroms));
        assert_eq!(s, "chr1\t3\nchr2\t5\n");
    }

    #[test]
    fn run_spans_cover_nonzero_positions() {
        let counts = [0, 5, 5, 1, 0, 0, 2, 2, 2, 7];
        let chroms = table(&[10]);
        let s = to_string(|w| write_bed(w, &counts, &chroms, Transform::Frequency, true));
        let covered: u64 = s
            .lines()
            .map(|l| {
                let f: Vec<&str> = l.split('\t').collect();
                f[2].parse::<u64>().unwrap() - f[1].parse::<u64>().unwrap()
            })
            .sum();
        let nonzero = counts.iter().filter(|v| **v != 0).count() as u64;
        assert_eq!(covered, nonzero);
    }

    #[test]
    fn txt_values_cover_annotation() {
        let counts = [3, 1, 4, 1, 5, 9, 2, 6];
        let chroms = table(&[3, 5]);
        let s = to_string(|w| write_txt(w, &counts, &chroms, Transform::Frequency));
        let vals: Vec<u16> = s
            .lines()
            .filter(|l| !l.starts_with('>'))
            .flat_map(|l| l.split(' '))
            .filter(|x| !x.is_empty())
            .map(|x| x.parse().unwrap())
            .collect();
        assert_eq!(vals, counts.to_vec());
    }

    #[test]
    fn bed_round_trip() {
        let counts = [0, 5, 5, 1, 0, 0, 2, 2, 2, 7];
        let chroms = table(&[10]);
        let s = to_string(|w| write_bed(w, &counts, &chroms, Transform::Frequency, true));
        // rebuild the dense array from the runs, gaps filled with zero
        let mut rebuilt = [0u16; 10];
        for l in s.lines() {
            let f: Vec<&str> = l.split('\t').collect();
            let start = f[1].parse::<usize>().unwrap();
            let end = f[2].parse::<usize>().unwrap();
            let val = f[3].parse::<u16>().unwrap();
            for v in &mut rebuilt[start..end] {
                *v = val
            }
        }
        let t = to_string(|w| write_bed(w, &rebuilt, &chroms, Transform::Frequency, true));
        assert_eq!(s, t);
    }

    #[test]
    fn encoding_is_deterministic() {
        let counts = [3, 3, 0, 1, 2, 2];
        let chroms = table(&[6]);
        let a = to_string(|w| write_wig(w, &counts, &chroms, Transform::Mappability));
        let b = to_string(|w| write_wig(w, &counts, &chroms, Transform::Mappability));
        assert_eq!(a, b);
    }
}
