use std::ops::Range;

use crate::locations::KmerCoord;

/// Chromosome table of the concatenated input set: names and lengths in
/// genome order, with the derived cumulative start offsets kept as the
/// single source for all global/local coordinate conversions.
pub struct Chromosomes {
    names: Vec<String>,
    cum: Vec<u64>,
}

impl Chromosomes {
    pub fn new(chroms: Vec<(String, u64)>) -> anyhow::Result<Self> {
        if chroms.is_empty() {
            return Err(anyhow!("Empty chromosome table"));
        }
        let mut names = Vec::with_capacity(chroms.len());
        let mut cum = Vec::with_capacity(chroms.len() + 1);
        let mut total = 0;
        cum.push(0);
        for (name, l) in chroms {
            names.push(name);
            total += l;
            cum.push(total);
        }
        Ok(Self { names, cum })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn name(&self, ix: usize) -> &str {
        &self.names[ix]
    }

    #[inline]
    pub fn length(&self, ix: usize) -> u64 {
        self.cum[ix + 1] - self.cum[ix]
    }

    #[inline]
    pub fn start(&self, ix: usize) -> u64 {
        self.cum[ix]
    }

    pub fn total(&self) -> u64 {
        *self.cum.last().unwrap()
    }

    /// Span of chromosome `ix` within an annotation array of `limit`
    /// entries. Only the global tail of the array may be absent, so all
    /// spans except the last are complete; a chromosome lying entirely
    /// beyond `limit` gets an empty span.
    pub fn span(&self, ix: usize, limit: usize) -> Range<usize> {
        let start = (self.cum[ix] as usize).min(limit);
        let end = (self.cum[ix + 1] as usize).min(limit);
        start..end
    }

    /// Convert a global offset into a (chromosome, local offset)
    /// coordinate. `pos` must lie within the concatenated set.
    pub fn localize(&self, pos: u64) -> KmerCoord {
        assert!(pos < self.total(), "Position beyond end of chromosome table");
        let chrom = self.cum.partition_point(|c| *c <= pos) - 1;
        KmerCoord::new(chrom as u64, pos - self.cum[chrom])
    }
}

/// Groups consecutive chromosomes by the source file they came from.
/// Each entry records the index of the last chromosome belonging to
/// that file; the boundaries partition the full chromosome range.
pub struct FastaGroups {
    files: Vec<(String, u64)>,
}

impl FastaGroups {
    pub fn new(files: Vec<(String, u64)>) -> anyhow::Result<Self> {
        if files.is_empty() {
            return Err(anyhow!("Empty input file list"));
        }
        for w in files.windows(2) {
            if w[1].1 <= w[0].1 {
                return Err(anyhow!(
                    "Chromosome boundaries of input files not strictly increasing"
                ));
            }
        }
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.files.iter().map(|(name, b)| (name.as_str(), *b))
    }

    #[inline]
    pub fn name(&self, ix: usize) -> &str {
        &self.files[ix].0
    }

    /// Index of the last chromosome belonging to file `ix`.
    #[inline]
    pub fn last_chrom(&self, ix: usize) -> u64 {
        self.files[ix].1
    }

    /// Index of the first chromosome belonging to file `ix`.
    #[inline]
    pub fn first_chrom(&self, ix: usize) -> u64 {
        if ix == 0 {
            0
        } else {
            self.files[ix - 1].1 + 1
        }
    }
}

/// Concatenated input sequences together with their chromosome table
/// and source-file grouping.
pub struct Genome {
    chromosomes: Chromosomes,
    groups: FastaGroups,
    text: Vec<u8>,
}

impl Genome {
    pub fn new(chromosomes: Chromosomes, groups: FastaGroups, text: Vec<u8>) -> Self {
        assert_eq!(
            text.len() as u64,
            chromosomes.total(),
            "Sequence text does not match chromosome table"
        );
        Self {
            chromosomes,
            groups,
            text,
        }
    }

    pub fn chromosomes(&self) -> &Chromosomes {
        &self.chromosomes
    }

    pub fn groups(&self) -> &FastaGroups {
        &self.groups
    }

    /// The k bases starting at global offset `pos`.
    pub fn kmer_at(&self, pos: u64, k: usize) -> &[u8] {
        let p = pos as usize;
        &self.text[p..p + k]
    }
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            x => *x,
        })
        .collect()
}

/// Strand independent identity of a k-mer: the lexicographically
/// smaller of the sequence and its reverse complement.
pub fn canonical(seq: &[u8]) -> Vec<u8> {
    let rc = reverse_complement(seq);
    if rc.as_slice() < seq {
        rc
    } else {
        seq.to_vec()
    }
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

    #[test]
    fn localize_across_boundaries() {
        let c = table(&[3, 3]);
        assert_eq!(c.localize(0), KmerCoord::new(0, 0));
        assert_eq!(c.localize(2), KmerCoord::new(0, 2));
        assert_eq!(c.localize(3), KmerCoord::new(1, 0));
        assert_eq!(c.localize(5), KmerCoord::new(1, 2));
    }

    #[test]
    fn span_trims_to_annotation_length() {
        let c = table(&[3, 3]);
        assert_eq!(c.span(0, 4), 0..3);
        assert_eq!(c.span(1, 4), 3..4);
        assert_eq!(c.span(1, 6), 3..6);
        // second chromosome entirely beyond the array
        assert_eq!(c.span(1, 2), 2..2);
    }

    #[test]
    fn empty_table_rejected() {
        assert!(Chromosomes::new(Vec::new()).is_err());
    }

    #[test]
    fn group_boundaries() {
        let g = FastaGroups::new(vec![("a.fa".to_owned(), 1), ("b.fa".to_owned(), 4)]).unwrap();
        assert_eq!(g.first_chrom(0), 0);
        assert_eq!(g.last_chrom(0), 1);
        assert_eq!(g.first_chrom(1), 2);
        assert_eq!(g.last_chrom(1), 4);
    }

    #[test]
    fn group_boundaries_must_increase() {
        assert!(FastaGroups::new(vec![("a.fa".to_owned(), 2), ("b.fa".to_owned(), 2)]).is_err());
    }

    #[test]
    fn canonical_is_strand_independent() {
        for seq in [&b"ACGTT"[..], b"TTTTT", b"GATCA"] {
            assert_eq!(canonical(seq), canonical(&reverse_complement(seq)));
        }
        assert_eq!(canonical(b"TTT"), b"AAA".to_vec());
        assert_eq!(canonical(b"ACG"), b"ACG".to_vec());
    }
}
