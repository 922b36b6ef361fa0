use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::game::GameRules;

pub type PhotoId = u32;
pub type LevelId = u32;

pub const FIRST_LEVEL_ID: LevelId = 1;
pub const MIN_GRID_SIDE: u32 = 2;

/// Pixel size and location of a photo on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct PhotoImage {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    pub name: String,
    pub image: Option<PhotoImage>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    pub id: LevelId,
    pub cols: u32,
    pub rows: u32,
    pub photo_id: PhotoId,
}

impl Level {
    pub fn piece_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn has_valid_grid(&self) -> bool {
        self.cols >= MIN_GRID_SIDE && self.rows >= MIN_GRID_SIDE
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    rules: RulesEntry,
    #[serde(default)]
    photos: Vec<PhotoEntry>,
    #[serde(default)]
    levels: Vec<LevelEntry>,
}

#[derive(Deserialize, Default)]
struct RulesEntry {
    swap_duration: Option<f32>,
    shuffle_swaps_per_piece: Option<u32>,
    max_shuffle_passes: Option<u32>,
}

#[derive(Deserialize, Serialize)]
struct PhotoEntry {
    id: PhotoId,
    name: String,
    src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

#[derive(Serialize)]
struct PhotoListFile {
    photos: Vec<PhotoEntry>,
}

#[derive(Deserialize)]
struct LevelEntry {
    id: LevelId,
    cols: u32,
    rows: u32,
    photo_id: PhotoId,
}

/// Photos and levels available to the game, plus the rules they are played with.
///
/// Levels are kept sorted by id; ids are unique within each table.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    photos: Vec<Photo>,
    levels: Vec<Level>,
    rules: GameRules,
}

impl Catalog {
    pub fn new(photos: Vec<Photo>, levels: Vec<Level>) -> Result<Self, CatalogError> {
        let mut photo_ids = HashSet::new();
        for photo in &photos {
            if !photo_ids.insert(photo.id) {
                return Err(CatalogError::DuplicatePhoto(photo.id));
            }
        }
        let mut level_ids = HashSet::new();
        for level in &levels {
            if !level_ids.insert(level.id) {
                return Err(CatalogError::DuplicateLevel(level.id));
            }
        }
        let mut catalog = Self {
            photos,
            levels,
            rules: GameRules::default(),
        };
        catalog.sort_levels();
        catalog.warn_dangling();
        Ok(catalog)
    }

    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    /// Reads a TOML catalog. Relative image paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let catalog = Self::from_toml_str(&contents, base_dir)?;
        log::debug!(
            "loaded catalog {}: {} photos, {} levels",
            path.display(),
            catalog.photos.len(),
            catalog.levels.len()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        let rules = build_rules(&file.rules)?;

        let mut photos = Vec::with_capacity(file.photos.len());
        for entry in &file.photos {
            if entry.src.trim().is_empty() {
                return Err(CatalogError::EmptySrc(entry.id));
            }
            if entry.width.is_some() ^ entry.height.is_some() {
                return Err(CatalogError::PartialSize(entry.id));
            }
            photos.push(Photo {
                id: entry.id,
                name: entry.name.clone(),
                image: resolve_image(entry, base_dir),
            });
        }

        let levels = file
            .levels
            .iter()
            .map(|entry| Level {
                id: entry.id,
                cols: entry.cols,
                rows: entry.rows,
                photo_id: entry.photo_id,
            })
            .collect();

        Ok(Self::new(photos, levels)?.with_rules(rules))
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// All levels in ascending id order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels
            .binary_search_by_key(&id, |level| level.id)
            .ok()
            .map(|idx| &self.levels[idx])
    }

    pub fn photo(&self, id: PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    /// The level following `id`, or `None` when `id` is the last one.
    pub fn next_level(&self, id: LevelId) -> Option<&Level> {
        id.checked_add(1).and_then(|next| self.level(next))
    }

    /// Inserts `level` in id order. Returns false if the id is already taken.
    pub fn add_level(&mut self, level: Level) -> bool {
        match self.levels.binary_search_by_key(&level.id, |entry| entry.id) {
            Ok(_) => false,
            Err(idx) => {
                self.levels.insert(idx, level);
                true
            }
        }
    }

    pub fn remove_level(&mut self, id: LevelId) -> Option<Level> {
        let idx = self.levels.iter().position(|level| level.id == id)?;
        Some(self.levels.remove(idx))
    }

    /// Adds `photo` unless a photo with the same id exists.
    pub fn add_photo(&mut self, photo: Photo) -> bool {
        if self.photo(photo.id).is_some() {
            return false;
        }
        self.photos.push(photo);
        true
    }

    fn sort_levels(&mut self) {
        self.levels.sort_by_key(|level| level.id);
    }

    fn warn_dangling(&self) {
        for level in &self.levels {
            if self.photo(level.photo_id).is_none() {
                log::warn!(
                    "level {} references unknown photo {}",
                    level.id,
                    level.photo_id
                );
            }
            if !level.has_valid_grid() {
                log::warn!(
                    "level {} has invalid grid {}x{}",
                    level.id,
                    level.cols,
                    level.rows
                );
            }
        }
    }
}

fn build_rules(entry: &RulesEntry) -> Result<GameRules, CatalogError> {
    let mut rules = GameRules::default();
    if let Some(duration) = entry.swap_duration {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CatalogError::InvalidRule {
                name: "swap_duration",
            });
        }
        rules.swap_duration = duration;
    }
    if let Some(per_piece) = entry.shuffle_swaps_per_piece {
        if per_piece == 0 {
            return Err(CatalogError::InvalidRule {
                name: "shuffle_swaps_per_piece",
            });
        }
        rules.shuffle_swaps_per_piece = per_piece;
    }
    if let Some(passes) = entry.max_shuffle_passes {
        if passes == 0 {
            return Err(CatalogError::InvalidRule {
                name: "max_shuffle_passes",
            });
        }
        rules.max_shuffle_passes = passes;
    }
    Ok(rules)
}

fn resolve_image(entry: &PhotoEntry, base_dir: &Path) -> Option<PhotoImage> {
    let src_path = resolve_src_path(&entry.src, base_dir);
    let declared = entry.width.zip(entry.height);
    let (width, height) = match imagesize::size(&src_path) {
        Ok(size) => {
            let Some((width, height)) = checked_dimensions(&size) else {
                log::warn!(
                    "photo {} at {} is too large: {}x{}",
                    entry.id,
                    src_path.display(),
                    size.width,
                    size.height
                );
                return None;
            };
            if let Some((expected_width, expected_height)) = declared {
                if width != expected_width || height != expected_height {
                    log::warn!(
                        "photo {} at {} is {}x{} but catalog declares {}x{}",
                        entry.id,
                        src_path.display(),
                        width,
                        height,
                        expected_width,
                        expected_height
                    );
                }
            }
            (width, height)
        }
        Err(err) => match declared {
            Some(size) => {
                log::warn!(
                    "failed to read image size for '{}', falling back to catalog dimensions {}x{}: {}",
                    entry.src,
                    size.0,
                    size.1,
                    err
                );
                size
            }
            None => {
                log::warn!(
                    "photo {} has no readable image at {}: {}",
                    entry.id,
                    src_path.display(),
                    err
                );
                return None;
            }
        },
    };
    if width == 0 || height == 0 {
        return None;
    }
    Some(PhotoImage {
        src: src_path.to_string_lossy().into_owned(),
        width,
        height,
    })
}

fn checked_dimensions(size: &imagesize::ImageSize) -> Option<(u32, u32)> {
    Some((u32::try_from(size.width).ok()?, u32::try_from(size.height).ok()?))
}

fn resolve_src_path(src: &str, base_dir: &Path) -> PathBuf {
    let raw_path = PathBuf::from(src);
    if raw_path.is_absolute() {
        raw_path
    } else {
        base_dir.join(raw_path)
    }
}

/// Builds photo records for every readable image in `dir`.
///
/// Files are visited in name order and numbered from 0; the display name is
/// the file stem. Entries that are not images are skipped.
pub fn photos_from_dir(dir: &Path) -> Result<Vec<Photo>, CatalogError> {
    let read_dir = fs::read_dir(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut photos = Vec::new();
    for path in paths {
        let Ok(size) = imagesize::size(&path) else {
            log::debug!("skipping non-image {}", path.display());
            continue;
        };
        let Some((width, height)) = checked_dimensions(&size) else {
            log::warn!(
                "skipping {}: {}x{} is too large",
                path.display(),
                size.width,
                size.height
            );
            continue;
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        photos.push(Photo {
            id: photos.len() as PhotoId,
            name,
            image: Some(PhotoImage {
                src: path.to_string_lossy().into_owned(),
                width,
                height,
            }),
        });
    }
    log::debug!("found {} photos in {}", photos.len(), dir.display());
    Ok(photos)
}

/// Renders `[[photos]]` catalog entries for `photos`.
///
/// Each `src` is written relative to `catalog_dir`, the directory the catalog
/// file will live in, because [`Catalog::load`] resolves sources against it.
/// A source outside that directory is written as an absolute path. Photos
/// without an image are left out.
pub fn photos_to_toml(photos: &[Photo], catalog_dir: &Path) -> Result<String, CatalogError> {
    let photos = photos
        .iter()
        .filter_map(|photo| {
            let image = photo.image.as_ref()?;
            Some(PhotoEntry {
                id: photo.id,
                name: photo.name.clone(),
                src: src_relative_to(Path::new(&image.src), catalog_dir),
                width: Some(image.width),
                height: Some(image.height),
            })
        })
        .collect();
    Ok(toml::to_string(&PhotoListFile { photos })?)
}

fn src_relative_to(src: &Path, catalog_dir: &Path) -> String {
    if src.is_relative() == catalog_dir.is_relative() {
        if let Ok(relative) = src.strip_prefix(catalog_dir) {
            return relative.to_string_lossy().into_owned();
        }
    }
    let absolute = match (src.canonicalize(), catalog_dir.canonicalize()) {
        (Ok(src), Ok(dir)) => match src.strip_prefix(&dir) {
            Ok(relative) => return relative.to_string_lossy().into_owned(),
            Err(_) => src,
        },
        (Ok(src), Err(_)) => src,
        (Err(err), _) => {
            log::warn!("cannot resolve {}: {}", src.display(), err);
            src.to_path_buf()
        }
    };
    absolute.to_string_lossy().into_owned()
}
