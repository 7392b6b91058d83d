//! 系统文件对话框：交给外部程序（zenity / osascript / PowerShell）
//! 取消或找不到对应程序时返回 None

use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickKind {
    File,
    Directory,
}

pub(crate) fn pick_file(title: &str) -> Option<PathBuf> {
    pick(title, PickKind::File)
}

pub(crate) fn pick_directory(title: &str) -> Option<PathBuf> {
    pick(title, PickKind::Directory)
}

fn pick(title: &str, kind: PickKind) -> Option<PathBuf> {
    let (program, args) = dialog_command(title, kind);
    let out = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match out {
        Ok(o) if o.status.success() => parse_selection(&String::from_utf8_lossy(&o.stdout)),
        Ok(o) => {
            debug!("{} 对话框已取消 ({})", program, o.status);
            None
        }
        Err(e) => {
            debug!("无法启动 {}: {}", program, e);
            None
        }
    }
}

/// 对话框输出的第一行非空文本
fn parse_selection(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn dialog_command(title: &str, kind: PickKind) -> (&'static str, Vec<String>) {
    let what = match kind {
        PickKind::File => "file",
        PickKind::Directory => "folder",
    };
    let script = format!(
        "POSIX path of (choose {} with prompt \"{}\")",
        what,
        title.replace('"', "\\\"")
    );
    ("osascript", vec!["-e".into(), script])
}

#[cfg(windows)]
fn dialog_command(title: &str, kind: PickKind) -> (&'static str, Vec<String>) {
    let title = title.replace('\'', "''");
    let script = match kind {
        PickKind::File => format!(
            "Add-Type -AssemblyName System.Windows.Forms; \
             $d = New-Object System.Windows.Forms.OpenFileDialog; $d.Title = '{}'; \
             $d.Filter = 'Executable files (*.exe)|*.exe|All files (*.*)|*.*'; \
             if ($d.ShowDialog() -eq 'OK') {{ $d.FileName }}",
            title
        ),
        PickKind::Directory => format!(
            "Add-Type -AssemblyName System.Windows.Forms; \
             $d = New-Object System.Windows.Forms.FolderBrowserDialog; $d.Description = '{}'; \
             if ($d.ShowDialog() -eq 'OK') {{ $d.SelectedPath }}",
            title
        ),
    };
    ("powershell", vec!["-NoProfile".into(), "-Command".into(), script])
}

#[cfg(not(any(windows, target_os = "macos")))]
fn dialog_command(title: &str, kind: PickKind) -> (&'static str, Vec<String>) {
    let mut args = vec!["--file-selection".to_string(), format!("--title={}", title)];
    if kind == PickKind::Directory {
        args.push("--directory".into());
    }
    ("zenity", args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_takes_first_non_empty_line() {
        assert_eq!(parse_selection("\n /home/me/art \n"), Some(PathBuf::from("/home/me/art")));
        assert_eq!(parse_selection("  \n"), None);
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn zenity_directory_flag() {
        let (prog, args) = dialog_command("Sprites", PickKind::Directory);
        assert_eq!(prog, "zenity");
        assert_eq!(args, vec!["--file-selection", "--title=Sprites", "--directory"]);
        let (_, args) = dialog_command("App", PickKind::File);
        assert!(!args.contains(&"--directory".to_string()));
    }
}
