/// Where a parameter value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The donor id, used as the run id of the caller
    DonorId,
    /// A `<id>|<name>` file reference field of the task input
    File(&'static str),
    /// A file produced by an earlier task, whose id is in `task_field`, chosen by name suffix
    UpstreamOutput { task_field: &'static str, suffix: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub target: &'static str,
    pub source: Source,
}

#[derive(Debug)]
pub struct AppSpec {
    pub name: &'static str,
    pub fields: &'static [Field],
}

const fn run_id() -> Field {
    Field { target: "run-id", source: Source::DonorId }
}

/// A file parameter read from the input field of the same name
const fn file(name: &'static str) -> Field {
    Field { target: name, source: Source::File(name) }
}

pub static APPS: &[AppSpec] = &[
    AppSpec {
        name: "pcawg-delly-caller",
        fields: &[
            run_id(),
            file("tumor-bam"),
            file("normal-bam"),
            file("reference-gz"),
            file("reference-gc"),
        ],
    },
    AppSpec {
        name: "pcawg-dkfz-caller",
        fields: &[
            run_id(),
            file("tumor-bam"),
            file("normal-bam"),
            file("reference-gz"),
            Field {
                target: "delly-bedpe",
                source: Source::UpstreamOutput {
                    task_field: "delly_task_id",
                    suffix: ".somatic.sv.bedpe.txt",
                },
            },
        ],
    },
    AppSpec {
        name: "pcawg-sanger-caller",
        fields: &[file("tumor"), file("normal"), file("refFrom"), file("bbFrom")],
    },
];

pub fn lookup(name: &str) -> Option<&'static AppSpec> {
    APPS.iter().find(|app| app.name == name)
}
