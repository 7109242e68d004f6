#[derive(Debug, Clone, Default)]
pub enum BarColor {
    #[default]
    CYAN,
    MAGENTA,
    RED,
    GREEN,
}

#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub trial_index: u32,
    pub file_index: u32,
    pub worker_id: usize,
    pub color: BarColor,
}

impl WorkerStatus {
    pub fn new(
        progress: f32,
        trial_index: u32,
        file_index: u32,
        worker_id: usize,
        color: BarColor,
    ) -> Self {
        Self {
            progress,
            trial_index,
            file_index,
            worker_id,
            color,
        }
    }
}
