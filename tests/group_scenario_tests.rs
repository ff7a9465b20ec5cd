//! End-to-end classification scenarios over real directory trees.

mod common;

use regex::Regex;

use file_groups::{GroupsOptions, ResolverOptions};

use common::Tree;

#[test]
fn basic_split_between_protect_and_work_roots() {
    let tree = Tree::new(&["ki/Af11.jpg", "df/Bf11.jpg"], &[]);

    let groups = tree.collect(
        &["ki"],
        &["df"],
        ResolverOptions::default(),
        GroupsOptions::default(),
        Vec::new(),
    );

    assert_eq!(
        tree.rel_files(groups.must_protect.files.keys().cloned()),
        vec!["ki/Af11.jpg"]
    );
    assert_eq!(
        tree.rel_files(groups.may_work_on.files.keys().cloned()),
        vec!["df/Bf11.jpg"]
    );
}

#[test]
fn config_files_and_options_drive_protection() {
    // The whole classification stack at once: caller-supplied patterns,
    // site/user global patterns, in-tree local and recursive patterns, and
    // overlapping protect/work roots.
    let tree = Tree::new(
        &[
            "ki/Af11.jpg",
            "df/Bf11.jpg",
            "ki/df/Af11.jpg",
            "ki/ki/ki/ki/Af11.jpg",
            "ki/df/KEEP_ME.JPEG",
            "ki/df/NOT_ME.jpeg",
            "df/df/KEEP_ME.jpg",
            "df/df/df/df/KEEP_ME.jpg",
            "df/AND_ME.JPG",
            "df/df/AND_ME.JPG",
            "df/df/df/And_Me.jpg",
            "df/df/df/and_me.jpeg",
            "df/df/df/df/gusr1aaa.jpg",
            "df/gsys2zzz.txt",
            "df/imatchopt.hello",
            "ki/df/df/IMATCHOPT.hi",
            "df/P1a.jpg",
        ],
        &[],
    );

    // Site and user config dirs contribute only their 'global' patterns.
    tree.write_file(
        "conf/sys/file_groups.conf",
        r#"
[file_groups.protect]
local = ["P1.*\\.jpg"]
global = ["gsys1.*\\.jpg", "gsys2.*"]
"#,
    );
    tree.write_file(
        "conf/home/file_groups.conf",
        r#"
[file_groups.protect]
global = ["gusr1.*\\.jpg"]
"#,
    );

    tree.write_file(
        "ki/.file_groups.conf",
        r#"
[file_groups.protect]
recursive = ["KEEP_ME\\..*"]
"#,
    );
    tree.write_file(
        "df/df/.file_groups.conf",
        r#"
[file_groups.protect]
local = ["KEEP_ME.jpg"]
recursive = ["(?i)and_me.jp[e]?g"]
"#,
    );

    let groups = tree.collect(
        &["ki"],
        &["df", "ki/df"],
        ResolverOptions {
            protect: vec![Regex::new(r"(?i)imatchopt\..*$").unwrap()],
            ..Default::default()
        },
        GroupsOptions::default(),
        vec![tree.path("conf/sys"), tree.path("conf/home")],
    );

    assert_eq!(
        tree.rel_files(groups.must_protect.files.keys().cloned()),
        vec![
            "df/df/AND_ME.JPG",
            "df/df/KEEP_ME.jpg",
            "df/df/df/And_Me.jpg",
            "df/df/df/and_me.jpeg",
            "df/df/df/df/gusr1aaa.jpg",
            "df/gsys2zzz.txt",
            "df/imatchopt.hello",
            "ki/Af11.jpg",
            "ki/df/KEEP_ME.JPEG",
            "ki/df/df/IMATCHOPT.hi",
            "ki/ki/ki/ki/Af11.jpg",
        ]
    );
    assert_eq!(
        tree.rel_files(groups.may_work_on.files.keys().cloned()),
        vec![
            "df/AND_ME.JPG",
            "df/Bf11.jpg",
            "df/P1a.jpg",
            "df/df/df/df/KEEP_ME.jpg",
            "ki/df/Af11.jpg",
            "ki/df/NOT_ME.jpeg",
        ]
    );
}

#[test]
fn remembered_configs_list_config_dirs_then_tree_dirs() {
    let tree = Tree::new(&["ki/Af11.jpg", "df/Bf11.jpg"], &[]);
    tree.write_file(
        "conf/sys/file_groups.conf",
        "[file_groups.protect]\nlocal = [\"P1.*\\\\.jpg\"]\n",
    );
    tree.write_file(
        "conf/home/file_groups.conf",
        "[file_groups.protect]\nrecursive = [\"PP.*.jpg\"]\n",
    );

    let groups = tree.collect(
        &["ki"],
        &["df"],
        ResolverOptions {
            remember_configs: true,
            ..Default::default()
        },
        GroupsOptions::default(),
        vec![tree.path("conf/sys"), tree.path("conf/home")],
    );

    let remembered: Vec<String> = groups
        .config_files
        .per_dir_configs()
        .keys()
        .map(|p| p.display().to_string())
        .collect();
    assert_eq!(
        remembered,
        vec![
            tree.path("conf/sys").display().to_string(),
            tree.path("conf/home").display().to_string(),
            tree.path("ki").display().to_string(),
            tree.path("df").display().to_string(),
        ]
    );

    // No 'global' keys anywhere: nothing reaches the tree configs.
    let ki = &groups.config_files.per_dir_configs()[&tree.path("ki")];
    assert!(ki.local.is_empty());
    assert!(ki.recursive.is_empty());
}

#[test]
fn stats_report_collected_counts() {
    let tree = Tree::new(
        &["ki/a.jpg", "df/b.jpg", "df/sub/c.jpg"],
        &[("b.jpg", "df/bsym")],
    );

    let groups = tree.collect(
        &["ki"],
        &["df"],
        ResolverOptions::default(),
        GroupsOptions {
            sink: tree.sink.clone(),
            ..Default::default()
        },
        Vec::new(),
    );
    groups.stats();

    assert!(tree.sink.contains("collected protect_directories: 1"));
    assert!(tree.sink.contains("collected work_on_directories: 2"));
    assert!(tree.sink.contains("collected must_protect_files: 1"));
    assert!(tree.sink.contains("collected may_work_on_files: 2"));
    assert!(tree.sink.contains("collected may_work_on_symlinks: 1"));
}
