use crate::scarletbook::constants::{
    MAX_MASTER_LANGUAGE_COUNT, SUPPORTED_VERSION_MAJOR, SUPPORTED_VERSION_MINOR,
};
use crate::scarletbook::error::{TocError, TocResult};
use crate::scarletbook::models::common::{GenreEntry, Locale};
use binrw::{BinRead, BinWrite};
use chrono::NaiveDate;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct TocVersion {
    pub major: u8,
    pub minor: u8,
}

impl TocVersion {
    pub fn validate(&self) -> TocResult<()> {
        if self.major != SUPPORTED_VERSION_MAJOR || self.minor > SUPPORTED_VERSION_MINOR {
            return Err(TocError::UnsupportedVersion {
                major: self.major,
                minor: self.minor,
            });
        }
        Ok(())
    }
}

/// Master TOC, the first sector at LSN 510. Describes the album and where
/// the area TOCs live.
#[derive(Debug, Clone, BinRead, BinWrite)]
#[brw(big, magic = b"SACDMTOC")]
pub struct MasterToc {
    pub version: TocVersion,
    pub reserved01: [u8; 6],
    pub album_set_size: u16,
    pub album_sequence_number: u16,
    pub reserved02: [u8; 4],
    /// 0x00 when empty, space padded otherwise.
    pub album_catalog_number: [u8; 16],
    pub album_genre: [GenreEntry; 4],
    pub reserved03: [u8; 8],
    pub area_1_toc_1_start: u32,
    pub area_1_toc_2_start: u32,
    pub area_2_toc_1_start: u32,
    pub area_2_toc_2_start: u32,
    /// Bit 7 flags a hybrid disc, the rest is reserved.
    pub disc_type: u8,
    pub reserved04: [u8; 3],
    pub area_1_toc_size: u16,
    pub area_2_toc_size: u16,
    pub disc_catalog_number: [u8; 16],
    pub disc_genre: [GenreEntry; 4],
    pub disc_date_year: u16,
    pub disc_date_month: u8,
    pub disc_date_day: u8,
    pub reserved05: [u8; 4],
    /// Can be zero, very seldom.
    pub text_area_count: u8,
    pub reserved06: [u8; 7],
    pub locales: [Locale; MAX_MASTER_LANGUAGE_COUNT],
}

impl MasterToc {
    pub const HYBRID_FLAG: u8 = 0x80;

    /// Parses and validates the master TOC sector.
    pub fn parse(sector: &[u8]) -> TocResult<Self> {
        let toc = Self::read(&mut Cursor::new(sector))?;
        toc.version.validate()?;

        if toc.text_area_count as usize > MAX_MASTER_LANGUAGE_COUNT {
            return Err(TocError::Format(format!(
                "master TOC declares {} text channels",
                toc.text_area_count
            )));
        }

        Ok(toc)
    }

    pub fn is_hybrid(&self) -> bool {
        self.disc_type & Self::HYBRID_FLAG != 0
    }

    pub fn set_hybrid(&mut self, hybrid: bool) {
        if hybrid {
            self.disc_type |= Self::HYBRID_FLAG;
        } else {
            self.disc_type &= !Self::HYBRID_FLAG;
        }
    }

    pub fn album_catalog_number(&self) -> Option<String> {
        catalog_number(&self.album_catalog_number)
    }

    pub fn disc_catalog_number(&self) -> Option<String> {
        catalog_number(&self.disc_catalog_number)
    }

    pub fn disc_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.disc_date_year as i32,
            self.disc_date_month as u32,
            self.disc_date_day as u32,
        )
    }

    /// Primary and backup TOC locations with their length, per area slot.
    pub fn area_locations(&self) -> [(u32, u32, u16); 2] {
        [
            (
                self.area_1_toc_1_start,
                self.area_1_toc_2_start,
                self.area_1_toc_size,
            ),
            (
                self.area_2_toc_1_start,
                self.area_2_toc_2_start,
                self.area_2_toc_size,
            ),
        ]
    }
}

fn catalog_number(raw: &[u8; 16]) -> Option<String> {
    if raw[0] == 0 {
        return None;
    }
    let text: String = raw
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect();
    let text = text.trim_end().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::scarletbook::constants::SACD_LSN_SIZE;

    pub fn sample_master_toc() -> MasterToc {
        MasterToc {
            version: TocVersion {
                major: 1,
                minor: 20,
            },
            reserved01: [0; 6],
            album_set_size: 2,
            album_sequence_number: 1,
            reserved02: [0; 4],
            album_catalog_number: *b"ALB-0001        ",
            album_genre: [
                GenreEntry {
                    category: 1,
                    reserved: 0,
                    genre: 5,
                },
                GenreEntry::default(),
                GenreEntry::default(),
                GenreEntry::default(),
            ],
            reserved03: [0; 8],
            area_1_toc_1_start: 544,
            area_1_toc_2_start: 554,
            area_2_toc_1_start: 0,
            area_2_toc_2_start: 0,
            disc_type: 0x80,
            reserved04: [0; 3],
            area_1_toc_size: 10,
            area_2_toc_size: 0,
            disc_catalog_number: [0; 16],
            disc_genre: [GenreEntry::default(); 4],
            disc_date_year: 2004,
            disc_date_month: 6,
            disc_date_day: 21,
            reserved05: [0; 4],
            text_area_count: 1,
            reserved06: [0; 7],
            locales: [
                Locale {
                    language_code: *b"en",
                    character_set: 2,
                    reserved: 0,
                },
                Locale::default(),
                Locale::default(),
                Locale::default(),
                Locale::default(),
                Locale::default(),
                Locale::default(),
                Locale::default(),
            ],
        }
    }

    pub fn sector_bytes(toc: &MasterToc) -> Vec<u8> {
        let mut buf = Vec::new();
        toc.write(&mut Cursor::new(&mut buf)).unwrap();
        buf.resize(SACD_LSN_SIZE, 0);
        buf
    }

    #[test]
    fn master_toc_layout_is_168_bytes() {
        let mut buf = Vec::new();
        sample_master_toc().write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), 168);
        assert_eq!(&buf[0..8], b"SACDMTOC");
        // area 1 primary TOC start, big-endian at offset 64
        assert_eq!(&buf[64..68], &544u32.to_be_bytes());
        assert_eq!(buf[80], 0x80);
    }

    #[test]
    fn master_toc_round_trip() {
        let toc = sample_master_toc();
        let read = MasterToc::parse(&sector_bytes(&toc)).unwrap();

        assert_eq!(read.version, toc.version);
        assert_eq!(read.album_set_size, 2);
        assert_eq!(read.album_sequence_number, 1);
        assert_eq!(read.area_1_toc_1_start, 544);
        assert_eq!(read.area_1_toc_size, 10);
        assert_eq!(read.text_area_count, 1);
        assert!(read.is_hybrid());
        assert_eq!(read.album_catalog_number().as_deref(), Some("ALB-0001"));
        assert_eq!(read.disc_catalog_number(), None);
        assert_eq!(read.disc_date(), NaiveDate::from_ymd_opt(2004, 6, 21));
        assert_eq!(read.locales[0].language(), "en");
    }

    #[test]
    fn bad_magic_is_a_format_error() {
        let mut bytes = sector_bytes(&sample_master_toc());
        bytes[0..8].copy_from_slice(b"NOTASACD");
        assert!(matches!(MasterToc::parse(&bytes), Err(TocError::Format(_))));
    }

    #[test]
    fn version_outside_range_is_rejected() {
        let mut toc = sample_master_toc();
        toc.version = TocVersion { major: 2, minor: 0 };
        let result = MasterToc::parse(&sector_bytes(&toc));
        assert!(matches!(
            result,
            Err(TocError::UnsupportedVersion { major: 2, minor: 0 })
        ));

        toc.version = TocVersion {
            major: 1,
            minor: 21,
        };
        assert!(MasterToc::parse(&sector_bytes(&toc)).is_err());
    }

    #[test]
    fn hybrid_flag_toggles_only_bit_seven() {
        let mut toc = sample_master_toc();
        toc.disc_type = 0x81;
        toc.set_hybrid(false);
        assert_eq!(toc.disc_type, 0x01);
        assert!(!toc.is_hybrid());
        toc.set_hybrid(true);
        assert_eq!(toc.disc_type, 0x81);
    }
}
