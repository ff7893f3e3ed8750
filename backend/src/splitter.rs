//! Re-materialize chapters and scenes from separator lines in scene text.
//!
//! `# title|desc` starts a part, `## title|desc` a chapter and
//! `### title|desc` a scene. The text after the separator line belongs to
//! the new entity, and the scenes following in the chapter move along with a
//! new chapter.

use crate::helpers::{clip_title, max_numeric_id};
use crate::model::{Chapter, ChapterLevel, ElementType, Novel, Scene, SceneStatus};
use crate::ui::Translate;

pub const PART_SEPARATOR: &str = "#";
pub const CHAPTER_SEPARATOR: &str = "##";
pub const SCENE_SEPARATOR: &str = "###";
pub const DESC_SEPARATOR: char = '|';

const WARNING: &str = "(!)";

/// Title and description of a separator line.
fn parse_separator(line: &str) -> (String, String) {
    let heading = line.trim_matches(|c| c == '#' || c == ' ');
    let mut parts = heading.split(DESC_SEPARATOR);
    let title = parts.next().unwrap_or("").to_string();
    let desc = parts.next().unwrap_or("").to_string();
    (title, desc)
}

fn mark_warning(field: &mut Option<String>) {
    if let Some(text) = field.as_mut() {
        if !text.is_empty() && !text.starts_with(WARNING) {
            *text = format!("{}{}", WARNING, text);
        }
    }
}

/// A scene split off `parent`. The parent's outline fields get a warning
/// marker, since they may now describe the wrong scene.
fn split_off_scene(parent: &mut Scene, split_count: usize, title: &str, desc: &str, tr: &dyn Translate, clip: usize) -> Scene {
    let title = if !title.is_empty() {
        title.to_string()
    } else if let Some(parent_title) = parent.title.as_deref().filter(|t| !t.is_empty()) {
        format!("{} Split: {}", clip_title(parent_title, clip), split_count)
    } else {
        format!("{} Split: {}", tr.tr("New Scene"), split_count)
    };

    mark_warning(&mut parent.desc);
    mark_warning(&mut parent.goal);
    mark_warning(&mut parent.conflict);
    mark_warning(&mut parent.outcome);

    if parent.status.is_some_and(|s| s > SceneStatus::Draft) {
        parent.status = Some(SceneStatus::Draft);
    }

    let mut scene = Scene::default();
    scene.title = Some(title);
    scene.desc = (!desc.is_empty()).then(|| desc.to_string());
    scene.status = parent.status;
    scene.sc_type = parent.sc_type;
    scene.date = parent.date.clone();
    scene.time = parent.time.clone();
    scene.day = parent.day.clone();
    scene.lasts_days = parent.lasts_days.clone();
    scene.lasts_hours = parent.lasts_hours.clone();
    scene.lasts_minutes = parent.lasts_minutes.clone();
    scene
}

fn set_content(novel: &mut Novel, sc_id: &str, lines: &[&str]) {
    if let Some(scene) = novel.scenes.get_mut(sc_id) {
        scene.set_scene_content(lines.join("\n"));
    }
}

/// Split all scenes of `novel` at separator lines. Returns whether chapters
/// or scenes were created.
pub fn split_scenes(novel: &mut Novel, tr: &dyn Translate, clip: usize) -> bool {
    let mut ch_id_max = max_numeric_id(novel.chapters.keys());
    let mut sc_id_max = max_numeric_id(novel.scenes.keys());
    let mut scenes_split = false;
    let mut srt_chapters: Vec<String> = Vec::new();

    for ch_id in novel.srt_chapters.clone() {
        srt_chapters.push(ch_id.clone());
        let mut chapter_id = ch_id.clone();
        let mut srt_scenes: Vec<String> = Vec::new();
        let scene_ids = novel.chapters.get(&ch_id).map(|c| c.srt_scenes.clone()).unwrap_or_default();

        for sc_id in scene_ids {
            srt_scenes.push(sc_id.clone());
            let Some(content) = novel
                .scenes
                .get(&sc_id)
                .and_then(|s| s.scene_content())
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
            else {
                continue;
            };

            let mut scene_id = sc_id.clone();
            let mut new_lines: Vec<&str> = Vec::new();
            let mut in_scene = true;
            let mut split_count = 0;

            for line in content.split('\n') {
                if line.starts_with(SCENE_SEPARATOR) {
                    let (title, desc) = parse_separator(line);
                    set_content(novel, &scene_id, &new_lines);
                    new_lines.clear();
                    split_count += 1;
                    sc_id_max += 1;
                    scene_id = sc_id_max.to_string();
                    let Some(parent) = novel.scenes.get_mut(&sc_id) else {
                        continue;
                    };
                    let scene = split_off_scene(parent, split_count, &title, &desc, tr, clip);
                    novel.scenes.insert(scene_id.clone(), scene);
                    srt_scenes.push(scene_id.clone());
                    scenes_split = true;
                    in_scene = true;
                } else if line.starts_with(PART_SEPARATOR) {
                    let (title, desc) = parse_separator(line);
                    let level = if line.starts_with(CHAPTER_SEPARATOR) {
                        ChapterLevel::Chapter
                    } else {
                        ChapterLevel::Part
                    };
                    if in_scene {
                        set_content(novel, &scene_id, &new_lines);
                        new_lines.clear();
                        split_count = 0;
                        in_scene = false;
                    }
                    if let Some(chapter) = novel.chapters.get_mut(&chapter_id) {
                        chapter.srt_scenes = std::mem::take(&mut srt_scenes);
                    }
                    srt_scenes.clear();

                    ch_id_max += 1;
                    chapter_id = ch_id_max.to_string();
                    let title = if !title.is_empty() {
                        title
                    } else if level == ChapterLevel::Part {
                        tr.tr("New Part")
                    } else {
                        tr.tr("New Chapter")
                    };
                    let chapter = Chapter {
                        title: Some(title),
                        desc: (!desc.is_empty()).then_some(desc),
                        ch_level: Some(level),
                        ch_type: Some(ElementType::Normal),
                        ..Chapter::default()
                    };
                    novel.chapters.insert(chapter_id.clone(), chapter);
                    srt_chapters.push(chapter_id.clone());
                    scenes_split = true;
                } else if !in_scene {
                    // Text after a chapter separator opens a scene of its own.
                    new_lines.push(line);
                    split_count += 1;
                    sc_id_max += 1;
                    scene_id = sc_id_max.to_string();
                    let Some(parent) = novel.scenes.get_mut(&sc_id) else {
                        continue;
                    };
                    let scene = split_off_scene(parent, split_count, "", "", tr, clip);
                    novel.scenes.insert(scene_id.clone(), scene);
                    srt_scenes.push(scene_id.clone());
                    scenes_split = true;
                    in_scene = true;
                } else {
                    new_lines.push(line);
                }
            }

            if in_scene {
                set_content(novel, &scene_id, &new_lines);
            }
        }

        if let Some(chapter) = novel.chapters.get_mut(&chapter_id) {
            chapter.srt_scenes = srt_scenes;
        }
    }

    novel.srt_chapters = srt_chapters;
    if scenes_split {
        tracing::info!("Text split into {} chapters and {} scenes", novel.srt_chapters.len(), novel.scenes.len());
    }
    scenes_split
}
