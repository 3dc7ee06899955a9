use std::{
    io::{BufRead, Read},
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;

use crate::{
    genome::{Chromosomes, FastaGroups, Genome},
    locations::{Hits, Interval, KmerCoord, Locations, SelectionIntervals},
};

/// Read the input FASTA files in order, concatenating their sequences
/// and recording the per file chromosome boundaries.
pub fn read_fastas(paths: &[PathBuf]) -> anyhow::Result<Genome> {
    let mut chroms: Vec<(String, u64)> = Vec::new();
    let mut files: Vec<(String, u64)> = Vec::new();
    let mut text = Vec::new();

    for path in paths {
        debug!("Reading sequences from {}", path.display());
        let rdr = CompressIo::new()
            .path(path)
            .bufreader()
            .with_context(|| format!("Could not open input file {}", path.display()))?;

        let n_before = chroms.len();
        scan_fasta(rdr, &mut chroms, &mut text)
            .with_context(|| format!("Error reading input file {}", path.display()))?;
        if chroms.len() == n_before {
            return Err(anyhow!("No sequences found in {}", path.display()));
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<input>")
            .to_owned();
        files.push((name, chroms.len() as u64 - 1));
    }
    info!(
        "Read {} sequences ({} bases) from {} files",
        chroms.len(),
        text.len(),
        paths.len()
    );

    Ok(Genome::new(
        Chromosomes::new(chroms)?,
        FastaGroups::new(files)?,
        text,
    ))
}

fn scan_fasta<R: BufRead>(
    mut rdr: R,
    chroms: &mut Vec<(String, u64)>,
    text: &mut Vec<u8>,
) -> anyhow::Result<()> {
    let mut buf = String::new();
    let mut in_seq = false;
    let mut line = 0;
    while rdr
        .read_line(&mut buf)
        .with_context(|| format!("Error reading line {}", line + 1))?
        > 0
    {
        line += 1;
        let s = buf.trim_end();
        if let Some(hdr) = s.strip_prefix('>') {
            // sequence names end at the first whitespace
            let name = hdr.split_whitespace().next().unwrap_or("");
            if name.is_empty() {
                return Err(anyhow!("Missing sequence name at line {}", line));
            }
            chroms.push((name.to_owned(), 0));
            in_seq = true
        } else if !s.is_empty() {
            if !in_seq {
                return Err(anyhow!("Bad FASTA format at line {}: expecting '>'", line));
            }
            for c in s.bytes() {
                if !c.is_ascii_graphic() {
                    return Err(anyhow!("Illegal character in sequence at line {}", line));
                }
                text.push(c.to_ascii_uppercase())
            }
            chroms.last_mut().unwrap().1 += s.len() as u64
        }
        buf.clear();
    }
    Ok(())
}

/// Read the per position annotation array: one little endian u16 per
/// base, as dumped by the upstream counting engine.
pub fn read_counts<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<u16>> {
    let mut rdr = CompressIo::new()
        .path(&path)
        .bufreader()
        .with_context(|| "Could not open counts file")?;
    debug!("Reading annotation array");

    let mut raw = Vec::new();
    rdr.read_to_end(&mut raw)
        .with_context(|| "Error reading counts file")?;
    let counts = decode_counts(&raw)?;
    debug!("Read {} annotation values", counts.len());
    Ok(counts)
}

fn decode_counts(raw: &[u8]) -> anyhow::Result<Vec<u16>> {
    if raw.len() & 1 != 0 {
        return Err(anyhow!("Truncated counts file: odd number of bytes"));
    }
    Ok(raw
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect())
}

/// Location index dump: one line per k-mer, three tab separated fields.
///
/// field 1: k-mer coordinate as `chrom,offset`
/// field 2: forward strand hits, `|` separated `chrom,offset` pairs (may be empty)
/// field 3: reverse strand hits, same encoding (may be empty)
///
/// Lines must be sorted ascending by coordinate, which is checked here.
pub fn read_locations<P: AsRef<Path>>(path: P) -> anyhow::Result<Locations> {
    let rdr = CompressIo::new()
        .path(&path)
        .bufreader()
        .with_context(|| "Could not open locations file")?;
    debug!("Reading location index");

    let loc = scan_locations(rdr)?;
    debug!("Read {} location entries", loc.len());
    Ok(loc)
}

fn scan_locations<R: BufRead>(mut rdr: R) -> anyhow::Result<Locations> {
    let mut buf = String::new();
    let mut entries = Vec::new();
    let mut line = 0;
    while rdr
        .read_line(&mut buf)
        .with_context(|| format!("Error reading line {} from locations file", line + 1))?
        > 0
    {
        line += 1;
        let mut itr = buf.trim_end().split('\t');
        let coord = itr
            .next()
            .ok_or_else(|| anyhow!("Missing coordinate at line {}", line))
            .and_then(parse_coord)
            .with_context(|| format!("Bad k-mer coordinate at line {}", line))?;
        let plus = parse_hits(itr.next().unwrap_or(""))
            .with_context(|| format!("Bad forward strand hits at line {}", line))?;
        let minus = parse_hits(itr.next().unwrap_or(""))
            .with_context(|| format!("Bad reverse strand hits at line {}", line))?;
        entries.push((coord, Hits::new(plus, minus)));
        buf.clear();
    }
    Locations::new(entries)
}

fn parse_coord(s: &str) -> anyhow::Result<KmerCoord> {
    let (c, o) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("Expecting a chrom,offset pair"))?;
    Ok(KmerCoord::new(c.parse()?, o.parse()?))
}

fn parse_hits(s: &str) -> anyhow::Result<Vec<KmerCoord>> {
    if s.is_empty() {
        Ok(Vec::new())
    } else {
        s.split('|').map(parse_coord).collect()
    }
}

/// Selection intervals: `chrom<TAB>start<TAB>end` per line, half open,
/// sorted ascending by (chrom, start) and non-overlapping (checked).
pub fn read_selection<P: AsRef<Path>>(path: P) -> anyhow::Result<SelectionIntervals> {
    let rdr = CompressIo::new()
        .path(&path)
        .bufreader()
        .with_context(|| "Could not open selection file")?;
    debug!("Reading selection intervals");

    let sel = scan_selection(rdr)?;
    debug!("Read {} selection intervals", sel.len());
    Ok(sel)
}

fn scan_selection<R: BufRead>(mut rdr: R) -> anyhow::Result<SelectionIntervals> {
    let mut buf = String::new();
    let mut intervals = Vec::new();
    let mut line = 0;
    while rdr
        .read_line(&mut buf)
        .with_context(|| format!("Error reading line {} from selection file", line + 1))?
        > 0
    {
        line += 1;
        let mut itr = buf.trim_end().split('\t');

        let chrom = itr
            .next()
            .ok_or_else(|| anyhow!("Missing chromosome at line {}", line))?
            .parse::<u64>()
            .with_context(|| format!("Bad chromosome value at line {}", line))?;
        let start = itr
            .next()
            .ok_or_else(|| anyhow!("Missing start at line {}", line))?
            .parse::<u64>()
            .with_context(|| format!("Bad start value at line {}", line))?;
        let end = itr
            .next()
            .ok_or_else(|| anyhow!("Missing end at line {}", line))?
            .parse::<u64>()
            .with_context(|| format!("Bad end value at line {}", line))?;

        if end <= start {
            return Err(anyhow!(
                "End value should be larger than start value at line {}",
                line
            ));
        }
        intervals.push(Interval::new(chrom, start, end));
        buf.clear();
    }
    SelectionIntervals::new(intervals)
}

mod test {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use std::io::BufReader;

    #[test]
    fn fasta_names_lengths_and_text() {
        let s = ">seq1 extra words\nacgt\nACG\n>seq2\nTTTT\n";
        let mut chroms = Vec::new();
        let mut text = Vec::new();
        scan_fasta(BufReader::new(s.as_bytes()), &mut chroms, &mut text).unwrap();
        assert_eq!(chroms, vec![("seq1".to_owned(), 7), ("seq2".to_owned(), 4)]);
        assert_eq!(text, b"ACGTACGTTTT".to_vec());
    }

    #[test]
    fn fasta_requires_header() {
        let mut chroms = Vec::new();
        let mut text = Vec::new();
        let r = scan_fasta(BufReader::new(&b"ACGT\n"[..]), &mut chroms, &mut text);
        assert!(r.is_err());
    }

    #[test]
    fn counts_decode() {
        assert_eq!(
            decode_counts(&[1, 0, 0, 1, 255, 255]).unwrap(),
            vec![1, 256, 65535]
        );
        assert!(decode_counts(&[1, 0, 0]).is_err());
    }

    #[test]
    fn locations_parse() {
        let s = "0,1\t0,1|1,4\t\n0,5\t0,5\t1,2\n1,0\t\t\n";
        let loc = scan_locations(BufReader::new(s.as_bytes())).unwrap();
        assert_eq!(loc.len(), 3);
        let v: Vec<_> = loc.iter().collect();
        assert_eq!(v[0].0, KmerCoord::new(0, 1));
        assert_eq!(v[0].1.plus(), &[KmerCoord::new(0, 1), KmerCoord::new(1, 4)]);
        assert!(v[0].1.minus().is_empty());
        assert_eq!(v[1].1.minus(), &[KmerCoord::new(1, 2)]);
        assert!(v[2].1.plus().is_empty());
    }

    #[test]
    fn unsorted_locations_rejected() {
        let s = "0,5\t\t\n0,1\t\t\n";
        assert!(scan_locations(BufReader::new(s.as_bytes())).is_err());
    }

    #[test]
    fn selection_parse() {
        let s = "0\t2\t5\n1\t0\t3\n";
        let sel = scan_selection(BufReader::new(s.as_bytes())).unwrap();
        assert_eq!(sel.len(), 2);
        assert!(scan_selection(BufReader::new(&b"0\t5\t2\n"[..])).is_err());
    }
}
