/// Journal behavior knobs.
#[derive(Clone, Debug)]
pub struct JournalConfig {
    /// Copy the target file aside before every destructive write.
    pub create_backups: bool,

    /// How many backups to keep per file, oldest deleted first.
    /// Zero means unlimited.
    pub max_backups: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        JournalConfig {
            create_backups: true,
            max_backups: 10,
        }
    }
}
