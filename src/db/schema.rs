pub const SCHEMA: &str = r#"
-- Images: one row per organized gallery file
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    phash TEXT NOT NULL UNIQUE,
    filename TEXT NOT NULL,
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,

    -- User actions
    favorite INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    rating INTEGER NOT NULL DEFAULT 0 CHECK (rating BETWEEN 0 AND 5),

    imported_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_images_rating ON images(rating);
CREATE INDEX IF NOT EXISTS idx_images_like_count ON images(like_count);
CREATE INDEX IF NOT EXISTS idx_images_favorite ON images(favorite);

-- Tags: unique by name, grouped by category
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    category TEXT,
    favorite INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_tags_category ON tags(category);

CREATE TABLE IF NOT EXISTS image_tags (
    image_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (image_id, tag_id),
    FOREIGN KEY (image_id) REFERENCES images(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_image_tags_tag ON image_tags(tag_id);

-- Albums: manual (explicit membership) or smart (stored criteria)
CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('manual', 'smart')),
    cover_image_id INTEGER,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (cover_image_id) REFERENCES images(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS album_images (
    album_id INTEGER NOT NULL,
    image_id INTEGER NOT NULL,
    added_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (album_id, image_id),
    FOREIGN KEY (album_id) REFERENCES albums(id) ON DELETE CASCADE,
    FOREIGN KEY (image_id) REFERENCES images(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_album_images_image ON album_images(image_id);

-- Smart album criteria, id sets stored as JSON integer arrays
CREATE TABLE IF NOT EXISTS smart_album_filters (
    album_id INTEGER PRIMARY KEY,
    include_tag_ids TEXT NOT NULL DEFAULT '[]',
    exclude_tag_ids TEXT NOT NULL DEFAULT '[]',
    include_album_ids TEXT NOT NULL DEFAULT '[]',
    exclude_album_ids TEXT NOT NULL DEFAULT '[]',
    min_rating INTEGER NOT NULL DEFAULT 0,
    favorite_only INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (album_id) REFERENCES albums(id) ON DELETE CASCADE
);
"#;

/// Migrations for databases created before a column existed.
/// Each statement may fail harmlessly when the column is already there.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE tags ADD COLUMN favorite INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE images ADD COLUMN imported_at TEXT",
];
