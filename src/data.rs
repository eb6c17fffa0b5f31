pub struct ReadingQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
    pub correct_index: usize,
    pub skill: &'static str,
}

pub const READING_BANK: &[ReadingQuestion] = &[
    ReadingQuestion {
        id: "sight-1",
        prompt: "Which word is 'the'?",
        options: &["ta", "the", "tho"],
        correct_index: 1,
        skill: "Sight word recognition",
    },
    ReadingQuestion {
        id: "rhyme-1",
        prompt: "Which word rhymes with \u{201c}cat\u{201d}?",
        options: &["dog", "sun", "hat"],
        correct_index: 2,
        skill: "Rhyming",
    },
    ReadingQuestion {
        id: "sound-1",
        prompt: "Which word starts with the same sound as \u{201c}ball\u{201d}?",
        options: &["cat", "bag", "sun"],
        correct_index: 1,
        skill: "Initial sound",
    },
];

// Demo curriculum, seeded into an empty database.

pub struct SeedLesson {
    pub id: &'static str,
    pub title: &'static str,
    /// (exercise id, prompt), in authored order
    pub exercises: &'static [(&'static str, &'static str)],
}

pub struct SeedSkill {
    pub id: &'static str,
    pub name: &'static str,
    pub lessons: &'static [SeedLesson],
}

pub struct SeedUnit {
    pub id: &'static str,
    pub title: &'static str,
    pub skills: &'static [SeedSkill],
}

pub struct SeedDomain {
    pub id: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
    pub units: &'static [SeedUnit],
    /// Skills attached directly to the domain, outside any unit.
    pub skills: &'static [SeedSkill],
}

pub const CURRICULUM: &[SeedDomain] = &[
    SeedDomain {
        id: "dom-math",
        slug: "math",
        name: "Math",
        units: &[
            SeedUnit {
                id: "unit-within-10",
                title: "Numbers within 10",
                skills: &[
                    SeedSkill {
                        id: "skill-add-10",
                        name: "Adding within 10",
                        lessons: &[SeedLesson {
                            id: "lesson-add-10",
                            title: "Counting on",
                            exercises: &[
                                ("ex-add-10-1", "2 + 1 = ?"),
                                ("ex-add-10-2", "3 + 3 = ?"),
                                ("ex-add-10-3", "4 + 5 = ?"),
                            ],
                        }],
                    },
                    SeedSkill {
                        id: "skill-sub-10",
                        name: "Subtracting within 10",
                        lessons: &[SeedLesson {
                            id: "lesson-sub-10",
                            title: "Taking away",
                            exercises: &[
                                ("ex-sub-10-1", "5 \u{2212} 2 = ?"),
                                ("ex-sub-10-2", "9 \u{2212} 4 = ?"),
                            ],
                        }],
                    },
                ],
            },
            SeedUnit {
                id: "unit-within-20",
                title: "Numbers within 20",
                skills: &[
                    SeedSkill {
                        id: "skill-add-20",
                        name: "Adding within 20",
                        lessons: &[
                            SeedLesson {
                                id: "lesson-make-ten",
                                title: "Make a ten",
                                exercises: &[
                                    ("ex-add-20-1", "7 + 8 = ?"),
                                    ("ex-add-20-2", "9 + 6 = ?"),
                                ],
                            },
                            SeedLesson {
                                id: "lesson-add-20",
                                title: "Bigger sums",
                                exercises: &[("ex-add-20-3", "12 + 5 = ?")],
                            },
                        ],
                    },
                    SeedSkill {
                        id: "skill-sub-20",
                        name: "Subtracting within 20",
                        lessons: &[SeedLesson {
                            id: "lesson-sub-20",
                            title: "Counting back",
                            exercises: &[
                                ("ex-sub-20-1", "18 \u{2212} 9 = ?"),
                                ("ex-sub-20-2", "15 \u{2212} 7 = ?"),
                            ],
                        }],
                    },
                ],
            },
        ],
        skills: &[],
    },
    SeedDomain {
        id: "dom-reading",
        slug: "reading",
        name: "Reading",
        units: &[],
        skills: &[
            SeedSkill {
                id: "skill-sight",
                name: "Sight word recognition",
                lessons: &[SeedLesson {
                    id: "lesson-sight",
                    title: "Little words",
                    exercises: &[
                        ("ex-sight-1", "Which word is 'the'?"),
                        ("ex-sight-2", "Which word is 'and'?"),
                    ],
                }],
            },
            SeedSkill {
                id: "skill-rhyme",
                name: "Rhyming",
                lessons: &[SeedLesson {
                    id: "lesson-rhyme",
                    title: "Sounds alike",
                    exercises: &[
                        ("ex-rhyme-1", "Which word rhymes with \u{201c}cat\u{201d}?"),
                        ("ex-rhyme-2", "Which word rhymes with \u{201c}sun\u{201d}?"),
                    ],
                }],
            },
        ],
    },
];

pub struct SeedProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub role: &'static str,
    pub parent_id: Option<&'static str>,
}

pub const PROFILES: &[SeedProfile] = &[
    SeedProfile { id: "parent", display_name: "Parent", role: "parent", parent_id: None },
    SeedProfile { id: "liv", display_name: "Liv", role: "learner", parent_id: Some("parent") },
    SeedProfile { id: "elle", display_name: "Elle", role: "learner", parent_id: Some("parent") },
];
