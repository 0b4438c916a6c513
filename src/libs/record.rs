use indexmap::IndexMap;
use std::io::{self, Write};

/// Cell written for a sample that has no data at a merged position.
pub const MISSING: &str = ".";

/// Number of mandatory columns, `#CHROM` through `INFO`.
pub const MANDATORY_COLUMNS: usize = 8;

/// Chromosome and position of a raw data line; the rest stays opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locus<'a> {
    pub chrom: &'a str,
    pub pos: u64,
}

impl<'a> Locus<'a> {
    /// ```
    /// use vcftk::libs::record::Locus;
    ///
    /// let locus = Locus::parse("chr1\t100\trs1\tA\tG\n").unwrap();
    /// assert_eq!((locus.chrom, locus.pos), ("chr1", 100));
    ///
    /// assert!(Locus::parse("chr1").is_none());
    /// assert!(Locus::parse("chr1\tabc\t.").is_none());
    /// ```
    pub fn parse(line: &'a str) -> Option<Self> {
        Self::from_bytes(line.as_bytes())
    }

    /// Parses a raw line. Only chromosome and position need to be UTF-8;
    /// the trailing columns may hold any bytes.
    pub fn from_bytes(line: &'a [u8]) -> Option<Self> {
        let mut fields = trim_eol(line).split(|&b| b == b'\t');
        let chrom = std::str::from_utf8(fields.next()?).ok()?;
        let pos = std::str::from_utf8(fields.next()?)
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        Some(Locus { chrom, pos })
    }
}

fn trim_eol(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = line {
        line = rest;
    }
    line
}

/// One fully parsed data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt: String,
    pub qual: String,
    pub filter: String,
    pub info: String,
    pub format: Option<String>,
    /// Sample name to genotype cell, in column order
    pub samples: IndexMap<String, String>,
}

impl Record {
    /// Parses a data line, pairing trailing columns with `sample_names` by index.
    ///
    /// Returns `None` for lines with fewer than eight columns or a
    /// non-integer position. Missing trailing sample cells are left out of the
    /// map rather than invented.
    pub fn parse(line: &str, sample_names: &[String]) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MANDATORY_COLUMNS {
            return None;
        }
        let pos = fields[1].trim().parse::<u64>().ok()?;

        let format = fields.get(MANDATORY_COLUMNS).map(|s| s.to_string());
        let values = fields.get(MANDATORY_COLUMNS + 1..).unwrap_or(&[]);

        let mut samples = IndexMap::with_capacity(sample_names.len());
        for (name, value) in sample_names.iter().zip(values.iter()) {
            samples.insert(name.clone(), value.to_string());
        }

        Some(Record {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            ref_allele: fields[3].to_string(),
            alt: fields[4].to_string(),
            qual: fields[5].to_string(),
            filter: fields[6].to_string(),
            info: fields[7].to_string(),
            format,
            samples,
        })
    }
}

/// All records sharing one `(chrom, pos)` across the merged inputs.
///
/// Scalar columns come from the first record seen; sample cells accumulate,
/// and a later record overwrites only the samples it carries itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub first: Record,
    pub contributors: usize,
}

impl MergedRecord {
    pub fn new(record: Record) -> Self {
        MergedRecord {
            first: record,
            contributors: 1,
        }
    }

    pub fn absorb(&mut self, record: Record) {
        self.first.samples.extend(record.samples);
        self.contributors += 1;
    }

    pub fn sample(&self, name: &str) -> Option<&str> {
        self.first.samples.get(name).map(String::as_str)
    }

    /// Writes one tab-delimited line with sample cells in `sample_order`.
    pub fn write<W: Write>(&self, writer: &mut W, sample_order: &[String]) -> io::Result<()> {
        let r = &self.first;
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.chrom, r.pos, r.id, r.ref_allele, r.alt, r.qual, r.filter, r.info
        )?;

        match &r.format {
            Some(format) => write!(writer, "\t{}", format)?,
            None if !sample_order.is_empty() => write!(writer, "\t{}", MISSING)?,
            None => {}
        }

        for name in sample_order {
            write!(writer, "\t{}", self.sample(name).unwrap_or(MISSING))?;
        }
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_record_parse() {
        let line = "1\t100\trs1\tA\tG\t50\tPASS\tDP=10\tGT\t0/1\t1/1\n";
        let rec = Record::parse(line, &names(&["S1", "S2"])).unwrap();

        assert_eq!(rec.chrom, "1");
        assert_eq!(rec.pos, 100);
        assert_eq!(rec.qual, "50");
        assert_eq!(rec.format.as_deref(), Some("GT"));
        assert_eq!(rec.samples.get("S1").unwrap(), "0/1");
        assert_eq!(rec.samples.get("S2").unwrap(), "1/1");
    }

    #[test]
    fn test_record_parse_sites_only() {
        let rec = Record::parse("2\t5\t.\tC\tT\t.\t.\t.", &[]).unwrap();
        assert!(rec.format.is_none());
        assert!(rec.samples.is_empty());
    }

    #[test]
    fn test_record_parse_malformed() {
        assert!(Record::parse("1\t100\trs1\tA\tG", &[]).is_none());
        assert!(Record::parse("1\tx\trs1\tA\tG\t.\t.\t.", &[]).is_none());
        assert!(Record::parse("", &[]).is_none());
    }

    #[test]
    fn test_locus_from_bytes_opaque_tail() {
        let locus = Locus::from_bytes(b"chr2\t77\t.\tA\tG\t.\t.\tNOTE=caf\xE9\r\n").unwrap();
        assert_eq!((locus.chrom, locus.pos), ("chr2", 77));

        assert_eq!(Locus::from_bytes(b"chr3\t8\n").unwrap().pos, 8);
        assert!(Locus::from_bytes(b"chr\xE9\t8\n").is_none());
    }

    #[test]
    fn test_record_parse_crlf() {
        let rec = Record::parse("1\t7\t.\tA\tC\t.\t.\t.\tGT\t0/0\r\n", &names(&["S1"])).unwrap();
        assert_eq!(rec.samples.get("S1").unwrap(), "0/0");
    }

    #[test]
    fn test_merged_record_union() {
        let a = Record::parse("1\t100\trsA\tA\tG\t50\tPASS\t.\tGT\t0/1\t0/0", &names(&["S1", "S3"]))
            .unwrap();
        let b = Record::parse("1\t100\trsB\tA\tT\t9\tLowQ\t.\tGT\t1/1\t1/0", &names(&["S2", "S3"]))
            .unwrap();

        let mut merged = MergedRecord::new(a);
        merged.absorb(b);

        // scalars from the first record, S3 overwritten by the later one
        assert_eq!(merged.first.id, "rsA");
        assert_eq!(merged.first.alt, "G");
        assert_eq!(merged.sample("S1"), Some("0/1"));
        assert_eq!(merged.sample("S2"), Some("1/1"));
        assert_eq!(merged.sample("S3"), Some("1/0"));
        assert_eq!(merged.contributors, 2);

        let mut out = Vec::new();
        merged
            .write(&mut out, &names(&["S0", "S1", "S2", "S3"]))
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1\t100\trsA\tA\tG\t50\tPASS\t.\tGT\t.\t0/1\t1/1\t1/0\n"
        );
    }

    #[test]
    fn test_merged_record_without_format() {
        let rec = Record::parse("X\t5\t.\tC\tT\t.\t.\t.", &[]).unwrap();
        let merged = MergedRecord::new(rec);

        let mut out = Vec::new();
        merged.write(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "X\t5\t.\tC\tT\t.\t.\t.\n");

        let mut out = Vec::new();
        merged.write(&mut out, &names(&["S1"])).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "X\t5\t.\tC\tT\t.\t.\t.\t.\t.\n");
    }
}
