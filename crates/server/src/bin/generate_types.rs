//! Writes the TypeScript declarations for the admin and public API to
//! `shared/types.ts`. Pass `--check` to fail when the file is stale instead.

use std::{env, fs, path::PathBuf};

use anyhow::{Context, bail};
use db::{
    CollectionKind, Direction, Member, Membership, MoveOutcome, PositionChange,
    models::{
        media::{CreateMedia, Media, MediaFilter, UpdateMedia},
        page::{Page, UpsertPage},
        setting::{Setting, UpsertSetting},
        story::{CreateStory, Story, UpdateStory},
        story_image::{CreateStoryImage, StoryImage, StoryImageUpdate},
    },
    schema::TableReport,
};
use server::routes::{
    AffectedRows, IdList,
    media::{BatchUpdateMedia, MoveMedia, ReorderMedia},
    public::HomeView,
    stories::{ReorderStories, StoryWithImages},
    story_images::{CreateStoryImages, ImageIdList, MoveStoryImage, UpdateStoryImages},
};
use ts_rs::TS;
use utils::response::ApiResponse;

fn generate_types_content() -> String {
    let decls = [
        ApiResponse::<()>::decl(),
        CollectionKind::decl(),
        Direction::decl(),
        Member::decl(),
        Membership::decl(),
        PositionChange::decl(),
        MoveOutcome::decl(),
        Media::decl(),
        CreateMedia::decl(),
        UpdateMedia::decl(),
        MediaFilter::decl(),
        Story::decl(),
        CreateStory::decl(),
        UpdateStory::decl(),
        StoryImage::decl(),
        CreateStoryImage::decl(),
        StoryImageUpdate::decl(),
        Setting::decl(),
        UpsertSetting::decl(),
        Page::decl(),
        UpsertPage::decl(),
        TableReport::decl(),
        IdList::decl(),
        AffectedRows::decl(),
        BatchUpdateMedia::decl(),
        ReorderMedia::decl(),
        MoveMedia::decl(),
        ReorderStories::decl(),
        StoryWithImages::decl(),
        CreateStoryImages::decl(),
        UpdateStoryImages::decl(),
        ImageIdList::decl(),
        MoveStoryImage::decl(),
        HomeView::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| format!("export {decl}"))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate-types`. Do not edit it by hand.\n\n{body}\n"
    )
}

fn main() -> anyhow::Result<()> {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path)
            .with_context(|| format!("reading {}", types_path.display()))?;
        if current != generated {
            bail!(
                "{} is out of date; run `cargo run --bin generate-types`",
                types_path.display()
            );
        }
        println!("✅ shared/types.ts is up to date.");
        return Ok(());
    }

    fs::create_dir_all(&shared_path)
        .with_context(|| format!("creating {}", shared_path.display()))?;
    fs::write(&types_path, generated)
        .with_context(|| format!("writing {}", types_path.display()))?;
    println!("✅ TypeScript types written to {}", types_path.display());
    Ok(())
}
