//! Deterministic note paths.

const REPLACED_WITH_UNDERSCORE: &[char] = &[
    '/', '\\', ':', '[', ']', '|', '#', '^', '*', '&', '?', '<', '>',
];

/// Make an assignment name safe to use as a file name on every platform.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' => '\'',
            c if REPLACED_WITH_UNDERSCORE.contains(&c) => '_',
            c => c,
        })
        .collect()
}

/// Path of the note for `name` inside `folder` (vault-relative, `/`-separated).
pub fn note_path(folder: &str, name: &str) -> String {
    let file_name = format!("{}.md", sanitize_file_name(name));
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name
    } else {
        format!("{folder}/{file_name}")
    }
}

/// Folder part of a vault-relative note path, `""` at the vault root.
pub fn parent_folder(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(folder, _)| folder)
}
