/// Dirty/clean counts derived from `git status --porcelain` output. This
/// summary is the sole authority for "safe to remove without force".
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusSummary {
    pub(crate) staged: usize,
    pub(crate) unstaged: usize,
    pub(crate) untracked: usize,
    pub(crate) total: usize,
    pub(crate) clean: bool,
    pub(crate) lines: Vec<String>,
}

pub(crate) fn summarize_porcelain(porcelain: &str) -> StatusSummary {
    let lines: Vec<String> = porcelain
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let mut staged = 0;
    let mut unstaged = 0;
    let mut untracked = 0;

    for line in &lines {
        if line.starts_with("??") {
            untracked += 1;
            continue;
        }

        let mut chars = line.chars();
        let staged_flag = chars.next();
        let unstaged_flag = chars.next();

        if staged_flag.is_some_and(|flag| flag != ' ') {
            staged += 1;
        }
        if unstaged_flag.is_some_and(|flag| flag != ' ') {
            unstaged += 1;
        }
    }

    let total = lines.len();
    StatusSummary {
        staged,
        unstaged,
        untracked,
        total,
        clean: total == 0,
        lines,
    }
}

impl StatusSummary {
    pub(crate) fn describe(&self) -> String {
        if self.clean {
            "clean".to_string()
        } else {
            format!(
                "dirty ({} staged, {} unstaged, {} untracked)",
                self.staged, self.unstaged, self.untracked
            )
        }
    }
}
