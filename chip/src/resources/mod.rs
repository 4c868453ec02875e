use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};
use zip::read::ZipArchive;

use crate::{definitions::rom, LoadError};

/// Represents an archive of roms, every file in the
/// zip archive is a single rom.
pub struct RomArchives<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl RomArchives<File> {
    /// Will open the zip archive at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> RomArchives<R> {
    /// Will generate a new rom archive object based of the given zip data
    pub fn from_reader(reader: R) -> Result<Self, LoadError> {
        Ok(RomArchives {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Will return all the rom names available to be chosen
    pub fn file_names(&self) -> Vec<&'_ str> {
        self.archive.file_names().collect()
    }

    /// Will decompress the information from the zip archive
    pub fn get_file_data(&mut self, name: &str) -> Result<Rom, LoadError> {
        let mut file = self.archive.by_name(name)?;
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        log::info!("extracted rom '{}' ({} bytes) from archive", name, data.len());
        Rom::new(name, data)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The program bytes, always an even amount
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data, fails if the
    /// rom does not fit between the program start and the end of memory.
    pub fn new(name: &str, mut data: Vec<u8>) -> Result<Self, LoadError> {
        if data.len() > rom::MAX_SIZE {
            return Err(LoadError::TooLarge {
                size: data.len(),
                max: rom::MAX_SIZE,
            });
        }
        // there might be a case where there is an uneven amount of
        // data entries adding one for simplicty.
        if data.len() % 2 != 0 {
            data.push(0);
        }
        Ok(Rom {
            name: name.to_string(),
            data: data.into_boxed_slice(),
        })
    }

    /// Will read the rom from the given file, the file name becomes the rom name.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("loaded rom '{}' ({} bytes)", name, data.len());
        Rom::new(&name, data)
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::{write::FileOptions, CompressionMethod, ZipWriter};

    use super::*;
    use crate::opcode::{build_opcode, Opcode};

    const RAW_ROM_DATA: [Opcode; 4] = [0x6005, 0x6103, 0x8014, 0x1206];

    fn rom_bytes() -> Vec<u8> {
        RAW_ROM_DATA.iter().flat_map(|op| op.to_be_bytes()).collect()
    }

    fn build_archive(names: &[&str]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for name in names {
            writer.start_file(*name, options).unwrap();
            writer.write_all(&rom_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_rom_extract() {
        let archive = build_archive(&["ADD"]);
        let mut ra = RomArchives::from_reader(Cursor::new(archive)).unwrap();
        let rom = ra.get_file_data("ADD").unwrap();
        let data = rom.get_data();

        assert_eq!(rom.get_name(), "ADD");
        for i in (0..data.len()).step_by(2) {
            let opcode = build_opcode(data, i).unwrap();
            assert_eq!(RAW_ROM_DATA[i / 2], opcode);
        }
    }

    #[test]
    fn test_file_names() {
        let names = ["PONG", "MAZE", "TETRIS"];
        let archive = build_archive(&names);
        let ra = RomArchives::from_reader(Cursor::new(archive)).unwrap();
        let mut files = ra.file_names();
        files.sort_unstable();

        assert_eq!(files, vec!["MAZE", "PONG", "TETRIS"]);
    }

    #[test]
    fn test_missing_rom() {
        let archive = build_archive(&["PONG"]);
        let mut ra = RomArchives::from_reader(Cursor::new(archive)).unwrap();
        assert!(matches!(ra.get_file_data("MAZE"), Err(LoadError::Archive(_))));
    }

    #[test]
    fn test_rom_padding() {
        let rom = Rom::new("odd", vec![0x60, 0x05, 0x12]).unwrap();
        assert_eq!(rom.get_data(), &[0x60, 0x05, 0x12, 0x00]);
    }

    #[test]
    fn test_rom_from_file() {
        let path = std::env::temp_dir().join(format!("chip8-{}-ADD.ch8", std::process::id()));
        std::fs::write(&path, rom_bytes()).unwrap();

        let rom = Rom::from_file(&path);
        std::fs::remove_file(&path).unwrap();
        let rom = rom.unwrap();

        assert_eq!(rom.get_name(), format!("chip8-{}-ADD", std::process::id()));
        assert_eq!(rom.get_data(), &rom_bytes()[..]);

        assert!(matches!(
            Rom::from_file(std::env::temp_dir().join("chip8-missing-rom.ch8")),
            Err(LoadError::Io(_))
        ));
    }

    #[test]
    fn test_rom_too_large() {
        assert!(Rom::new("full", vec![0; rom::MAX_SIZE]).is_ok());
        match Rom::new("overflow", vec![0; rom::MAX_SIZE + 1]) {
            Err(LoadError::TooLarge { size, max }) => {
                assert_eq!(size, rom::MAX_SIZE + 1);
                assert_eq!(max, 0x1000 - 0x200);
            }
            other => panic!("expected a too large error, got {:?}", other),
        }
    }
}
