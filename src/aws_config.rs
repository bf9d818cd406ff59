// AWS CLI config file (~/.aws/config) reader and writer
//
// Edits are line based: only the lines of the section being changed are
// touched, everything else (other profiles, comments, ordering) is written
// back exactly as it was read.
use crate::error::{KeeError, Result};
use crate::fs::{read_optional, write_atomic};
use crate::models::AccountEntry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the AWS config file path, honoring `AWS_CONFIG_FILE` like the AWS CLI does
pub fn default_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("AWS_CONFIG_FILE") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    if let Some(home) = dirs::home_dir() {
        Ok(home.join(".aws").join("config"))
    } else {
        Err(KeeError::Settings(
            "Could not determine home directory".to_string(),
        ))
    }
}

/// Section name used for a profile (`default` has no `profile ` prefix)
pub fn profile_section_name(profile_name: &str) -> String {
    if profile_name == "default" {
        profile_name.to_string()
    } else {
        format!("profile {}", profile_name)
    }
}

pub fn sso_session_section_name(session_name: &str) -> String {
    format!("sso-session {}", session_name)
}

/// SSO settings harvested from a profile after `aws configure sso`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDetails {
    pub sso_session: Option<String>,
    pub sso_start_url: String,
    pub sso_region: String,
    pub sso_account_id: String,
    pub sso_role_name: String,
    pub region: Option<String>,
    pub output: Option<String>,
}

impl ProfileDetails {
    pub fn into_entry(self, profile_name: &str) -> AccountEntry {
        AccountEntry {
            profile_name: profile_name.to_string(),
            sso_start_url: self.sso_start_url,
            sso_region: self.sso_region,
            sso_account_id: self.sso_account_id,
            sso_role_name: self.sso_role_name,
            session_name: self.sso_session.unwrap_or_default(),
            region: self.region,
            output: self.output,
            added_at: None,
        }
    }
}

/// Handle on the AWS config file
pub struct AwsConfigFile {
    path: PathBuf,
}

impl AwsConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents, empty when the file does not exist yet
    pub fn read(&self) -> Result<String> {
        Ok(read_optional(&self.path)?.unwrap_or_default())
    }

    /// Capture the file as it is now so a failed multi-step command can put it back
    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        Ok(ConfigSnapshot {
            path: self.path.clone(),
            content: read_optional(&self.path)?,
        })
    }

    /// Read the SSO settings of a profile, `None` if the profile is not defined
    pub fn profile_details(&self, profile_name: &str) -> Result<Option<ProfileDetails>> {
        let content = self.read()?;
        let document = Document::parse(&content)?;
        document.profile_details(profile_name)
    }

    /// Create or update the profile (and its sso-session) stanza for an account
    pub fn write_profile(&self, entry: &AccountEntry) -> Result<()> {
        let content = self.read()?;
        let mut document = Document::parse(&content)?;

        if entry.uses_sso_session() {
            document.upsert_section(
                &sso_session_section_name(&entry.session_name),
                &[
                    ("sso_start_url", entry.sso_start_url.as_str()),
                    ("sso_region", entry.sso_region.as_str()),
                ],
            );
        }

        let mut keys: Vec<(&str, &str)> = Vec::new();
        if entry.uses_sso_session() {
            keys.push(("sso_session", entry.session_name.as_str()));
        } else {
            keys.push(("sso_start_url", entry.sso_start_url.as_str()));
            keys.push(("sso_region", entry.sso_region.as_str()));
        }
        keys.push(("sso_account_id", entry.sso_account_id.as_str()));
        keys.push(("sso_role_name", entry.sso_role_name.as_str()));
        if let Some(region) = entry.region.as_deref() {
            keys.push(("region", region));
        }
        if let Some(output) = entry.output.as_deref() {
            keys.push(("output", output));
        }

        document.upsert_section(&profile_section_name(&entry.profile_name), &keys);

        let rendered = document.render();
        if rendered != content {
            write_atomic(&self.path, &rendered)?;
            tracing::info!(
                "Updated profile '{}' in {}",
                entry.profile_name,
                self.path.display()
            );
        }
        Ok(())
    }

    /// Delete a profile stanza, plus its sso-session stanza once no other
    /// profile refers to it. Returns whether anything was removed.
    pub fn remove_profile(&self, profile_name: &str, session_name: Option<&str>) -> Result<bool> {
        let Some(content) = read_optional(&self.path)? else {
            return Ok(false);
        };
        let mut document = Document::parse(&content)?;

        let mut removed = document.remove_section(&profile_section_name(profile_name));

        if let Some(session) = session_name.filter(|s| !s.is_empty()) {
            if document.profiles_using_session(session).is_empty() {
                removed |= document.remove_section(&sso_session_section_name(session));
            } else {
                tracing::debug!(
                    "Keeping sso-session '{}', still used by other profiles",
                    session
                );
            }
        }

        if removed {
            write_atomic(&self.path, &document.render())?;
            tracing::info!("Removed profile '{}' from {}", profile_name, self.path.display());
        }
        Ok(removed)
    }
}

/// Contents of the AWS config file at some point in time
pub struct ConfigSnapshot {
    path: PathBuf,
    content: Option<String>,
}

impl ConfigSnapshot {
    /// Put the file back exactly as it was; deletes it if it did not exist
    pub fn restore(&self) -> Result<()> {
        match &self.content {
            Some(content) => {
                if read_optional(&self.path)?.as_deref() != Some(content.as_str()) {
                    write_atomic(&self.path, content)?;
                }
            }
            None => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                }
            }
        }
        tracing::debug!("Restored {}", self.path.display());
        Ok(())
    }
}

/// One `[section]` of the file: header line index and the exclusive end of its body
#[derive(Debug, Clone)]
struct Section {
    name: String,
    start: usize,
    end: usize,
}

/// Validated, line-preserving view of an INI document
#[derive(Debug, Clone)]
struct Document {
    lines: Vec<String>,
    sections: Vec<Section>,
    /// Line terminator of the file as read, `\r\n` or `\n`
    newline: &'static str,
    final_newline: bool,
}

enum Line<'a> {
    Blank,
    Comment,
    Header(&'a str),
    Entry,
    Continuation,
}

fn is_comment(text: &str) -> bool {
    text.starts_with('#') || text.starts_with(';')
}

/// Split `key = value` or `key: value` at whichever delimiter comes first
fn split_entry(trimmed: &str) -> Option<(&str, &str)> {
    let pos = trimmed.find(|c: char| c == '=' || c == ':')?;
    let key = trimmed[..pos].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, trimmed[pos + 1..].trim()))
}

fn classify(line: &str, line_no: usize, have_key: bool) -> Result<Line<'_>> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Ok(Line::Blank);
    }
    if is_comment(trimmed) {
        return Ok(Line::Comment);
    }
    if let Some(rest) = trimmed.strip_prefix('[') {
        // `[name]`, optionally followed by an inline comment
        let malformed = || {
            KeeError::ConfigFormat(format!(
                "line {}: malformed section header '{}'",
                line_no, trimmed
            ))
        };
        let close = rest.find(']').ok_or_else(&malformed)?;
        let tail = rest[close + 1..].trim();
        if !tail.is_empty() && !is_comment(tail) {
            return Err(malformed());
        }
        let name = rest[..close].trim();
        if name.is_empty() {
            return Err(KeeError::ConfigFormat(format!(
                "line {}: empty section header",
                line_no
            )));
        }
        return Ok(Line::Header(name));
    }
    // Indented lines under a key belong to a nested value, e.g. `s3 =`
    if have_key && line.starts_with(|c: char| c == ' ' || c == '\t') {
        return Ok(Line::Continuation);
    }
    if split_entry(trimmed).is_some() {
        return Ok(Line::Entry);
    }

    Err(KeeError::ConfigFormat(format!(
        "line {}: expected 'key = value', comment or [section], found '{}'",
        line_no, trimmed
    )))
}

impl Document {
    fn parse(content: &str) -> Result<Self> {
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let mut sections: Vec<Section> = Vec::new();
        let mut have_key = false;

        for (idx, line) in lines.iter().enumerate() {
            match classify(line, idx + 1, have_key)? {
                Line::Header(name) => {
                    if let Some(previous) = sections.last_mut() {
                        previous.end = idx;
                    }
                    sections.push(Section {
                        name: name.to_string(),
                        start: idx,
                        end: lines.len(),
                    });
                    have_key = false;
                }
                Line::Entry => {
                    if sections.is_empty() {
                        return Err(KeeError::ConfigFormat(format!(
                            "line {}: setting outside of any [section]",
                            idx + 1
                        )));
                    }
                    have_key = true;
                }
                Line::Blank | Line::Comment | Line::Continuation => {}
            }
        }

        Ok(Self {
            lines,
            sections,
            newline: if content.contains("\r\n") { "\r\n" } else { "\n" },
            final_newline: content.is_empty() || content.ends_with('\n'),
        })
    }

    fn find(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Top-level `key = value` pairs of a section, with their line index
    fn entries(&self, section: &Section) -> Vec<(usize, String, String)> {
        self.lines[section.start + 1..section.end]
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.starts_with(|c: char| c == ' ' || c == '\t'))
            .filter_map(|(offset, line)| {
                let trimmed = line.trim();
                if is_comment(trimmed) {
                    return None;
                }
                let (key, value) = split_entry(trimmed)?;
                Some((section.start + 1 + offset, key.to_string(), value.to_string()))
            })
            .collect()
    }

    fn values(&self, name: &str) -> Option<HashMap<String, String>> {
        let section = self.find(name)?;
        Some(
            self.entries(section)
                .into_iter()
                .map(|(_, key, value)| (key, value))
                .collect(),
        )
    }

    fn profiles_using_session(&self, session: &str) -> Vec<String> {
        self.sections
            .iter()
            .filter(|s| s.name == "default" || s.name.starts_with("profile "))
            .filter(|s| {
                self.entries(s)
                    .iter()
                    .any(|(_, key, value)| key == "sso_session" && value == session)
            })
            .map(|s| s.name.clone())
            .collect()
    }

    fn profile_details(&self, profile_name: &str) -> Result<Option<ProfileDetails>> {
        let Some(profile) = self.values(&profile_section_name(profile_name)) else {
            return Ok(None);
        };

        let required = |values: &HashMap<String, String>, key: &str, section: &str| {
            values
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or_else(|| {
                    KeeError::ConfigFormat(format!("[{}] is missing '{}'", section, key))
                })
        };

        let profile_section = profile_section_name(profile_name);
        let sso_session = profile.get("sso_session").filter(|s| !s.is_empty()).cloned();

        let (sso_start_url, sso_region) = match &sso_session {
            Some(session) => {
                let session_section = sso_session_section_name(session);
                let values = self.values(&session_section).ok_or_else(|| {
                    KeeError::ConfigFormat(format!(
                        "[{}] refers to sso-session '{}' which is not defined",
                        profile_section, session
                    ))
                })?;
                (
                    required(&values, "sso_start_url", &session_section)?,
                    required(&values, "sso_region", &session_section)?,
                )
            }
            None => (
                required(&profile, "sso_start_url", &profile_section)?,
                required(&profile, "sso_region", &profile_section)?,
            ),
        };

        Ok(Some(ProfileDetails {
            sso_session,
            sso_start_url,
            sso_region,
            sso_account_id: required(&profile, "sso_account_id", &profile_section)?,
            sso_role_name: required(&profile, "sso_role_name", &profile_section)?,
            region: profile.get("region").cloned(),
            output: profile.get("output").cloned(),
        }))
    }

    /// Rewrite existing keys in place and append missing ones; append the
    /// section at the end of the file if it does not exist
    fn upsert_section(&mut self, name: &str, key_values: &[(&str, &str)]) {
        let Some(section) = self.find(name).cloned() else {
            // Goes after the last non-blank line; blank lines ending the file stay last
            let insert_at = self.content_end(0, self.lines.len());
            let mut added = Vec::with_capacity(key_values.len() + 2);
            if insert_at > 0 {
                added.push(String::new());
            }
            let start = insert_at + added.len();
            added.push(format!("[{}]", name));
            for (key, value) in key_values {
                added.push(format!("{} = {}", key, value));
            }
            self.lines.splice(insert_at..insert_at, added);

            if let Some(last) = self.sections.last_mut() {
                last.end = start;
            }
            self.sections.push(Section {
                name: name.to_string(),
                start,
                end: self.lines.len(),
            });
            return;
        };

        let existing = self.entries(&section);
        let mut missing = Vec::new();
        for (key, value) in key_values {
            match existing.iter().find(|(_, k, _)| k == key) {
                Some((idx, _, current)) => {
                    if current != value {
                        self.lines[*idx] = format!("{} = {}", key, value);
                    }
                }
                None => missing.push(format!("{} = {}", key, value)),
            }
        }

        if missing.is_empty() {
            return;
        }

        // After the last non-blank line, so the separator before the next section stays put
        let insert_at = self.content_end(section.start + 1, section.end);
        let added = missing.len();
        self.lines.splice(insert_at..insert_at, missing);

        for s in self.sections.iter_mut() {
            if s.start > section.start {
                s.start += added;
                s.end += added;
            } else if s.start == section.start {
                s.end += added;
            }
        }
    }

    /// Index just past the last non-blank line in `from..to`, or `from`
    fn content_end(&self, from: usize, to: usize) -> usize {
        (from..to)
            .rev()
            .find(|&idx| !self.lines[idx].trim().is_empty())
            .map_or(from, |idx| idx + 1)
    }

    /// Delete a section. A section in the middle goes with the blank lines
    /// separating it from the next one; the last section takes the single
    /// separator line before it and leaves the blank lines ending the file.
    fn remove_section(&mut self, name: &str) -> bool {
        let Some(position) = self.sections.iter().position(|s| s.name == name) else {
            return false;
        };
        let section = self.sections.remove(position);
        let is_last = position == self.sections.len();

        let (from, to) = if is_last {
            let to = self.content_end(section.start, section.end);
            let from = match section.start.checked_sub(1) {
                Some(prev) if self.lines[prev].trim().is_empty() => prev,
                _ => section.start,
            };
            (from, to)
        } else {
            (section.start, section.end)
        };

        let removed = to - from;
        self.lines.drain(from..to);

        for s in self.sections.iter_mut().skip(position) {
            s.start -= removed;
            s.end -= removed;
        }
        if is_last {
            if let Some(last) = self.sections.last_mut() {
                last.end = self.lines.len();
            }
        }
        true
    }

    fn render(&self) -> String {
        let mut result = self.lines.join(self.newline);
        if !result.is_empty() && self.final_newline {
            result.push_str(self.newline);
        }
        result
    }
}
