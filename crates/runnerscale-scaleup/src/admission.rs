//! Admission check — is every visible runner of a category saturated?

use runnerscale_core::LiveRunnerStatus;

/// Busy-state counts of the live runners relevant to one category.
///
/// Reported in logs and outcomes; the decision itself is
/// [`all_matching_busy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Non-offline runners carrying the category label.
    pub matching: usize,
    /// How many of those are idle.
    pub idle: usize,
}

impl Admission {
    pub fn evaluate<'a, I>(runners: I, label: &str) -> Self
    where
        I: IntoIterator<Item = &'a LiveRunnerStatus>,
    {
        let mut admission = Admission {
            matching: 0,
            idle: 0,
        };
        for runner in runners {
            if runner.carries_label(label) && !runner.is_offline() {
                admission.matching += 1;
                if !runner.busy {
                    admission.idle += 1;
                }
            }
        }
        admission
    }
}

/// The admission rule: true when every non-offline runner carrying `label`
/// is busy, including when there are none. An empty set admits because
/// nothing exists that could pick up the queued job.
pub fn all_matching_busy<'a, I>(runners: I, label: &str) -> bool
where
    I: IntoIterator<Item = &'a LiveRunnerStatus>,
{
    runners
        .into_iter()
        .filter(|r| r.carries_label(label) && !r.is_offline())
        .all(|r| r.busy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runnerscale_core::RunnerState;

    fn runner(id: u64, labels: &[&str], status: RunnerState, busy: bool) -> LiveRunnerStatus {
        LiveRunnerStatus {
            id,
            name: format!("runner-{id}"),
            status,
            busy,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn empty_fleet_admits() {
        let runners: Vec<LiveRunnerStatus> = Vec::new();
        assert!(all_matching_busy(&runners, "linux.2xlarge"));

        let admission = Admission::evaluate(&runners, "linux.2xlarge");
        assert_eq!(admission.matching, 0);
        assert_eq!(admission.idle, 0);
    }

    #[test]
    fn no_runner_with_label_admits() {
        let runners = vec![
            runner(1, &["self-hosted", "windows.4xlarge"], RunnerState::Online, false),
            runner(2, &["self-hosted", "linux.4xlarge"], RunnerState::Online, false),
        ];
        assert!(all_matching_busy(&runners, "linux.2xlarge"));
    }

    #[test]
    fn all_busy_admits() {
        let runners = vec![
            runner(1, &["linux.2xlarge"], RunnerState::Online, true),
            runner(2, &["linux.2xlarge"], RunnerState::Online, true),
            runner(3, &["linux.2xlarge"], RunnerState::Online, true),
        ];
        assert!(all_matching_busy(&runners, "linux.2xlarge"));
        assert_eq!(
            Admission::evaluate(&runners, "linux.2xlarge"),
            Admission { matching: 3, idle: 0 }
        );
    }

    #[test]
    fn one_idle_runner_rejects() {
        let runners = vec![
            runner(1, &["linux.2xlarge"], RunnerState::Online, true),
            runner(2, &["linux.2xlarge"], RunnerState::Online, false),
            runner(3, &["linux.2xlarge"], RunnerState::Online, true),
        ];
        assert!(!all_matching_busy(&runners, "linux.2xlarge"));

        let admission = Admission::evaluate(&runners, "linux.2xlarge");
        assert_eq!(admission.idle, 1);
    }

    #[test]
    fn offline_idle_runners_are_ignored() {
        let runners = vec![
            runner(1, &["linux.2xlarge"], RunnerState::Offline, false),
            runner(2, &["linux.2xlarge"], RunnerState::Online, true),
        ];
        assert!(all_matching_busy(&runners, "linux.2xlarge"));
        assert_eq!(Admission::evaluate(&runners, "linux.2xlarge").matching, 1);
    }

    #[test]
    fn idle_runner_of_other_category_does_not_block() {
        let runners = vec![
            runner(1, &["linux.2xlarge"], RunnerState::Online, true),
            runner(2, &["linux.8xlarge"], RunnerState::Online, false),
        ];
        assert!(all_matching_busy(&runners, "linux.2xlarge"));
        assert!(!all_matching_busy(&runners, "linux.8xlarge"));
    }

    #[test]
    fn label_match_is_exact() {
        let runners = vec![runner(1, &["linux.2xlarge.gpu"], RunnerState::Online, false)];
        assert!(all_matching_busy(&runners, "linux.2xlarge"));
    }

    #[test]
    fn counts_agree_with_the_rule() {
        let label = "linux.2xlarge";
        let cases = vec![
            vec![],
            vec![
                runner(1, &[label], RunnerState::Online, true),
                runner(2, &[label], RunnerState::Online, true),
            ],
            vec![
                runner(1, &[label], RunnerState::Online, true),
                runner(2, &[label], RunnerState::Online, false),
            ],
            vec![
                runner(1, &[label], RunnerState::Offline, false),
                runner(2, &[label], RunnerState::Online, true),
            ],
        ];
        let expected = [true, true, false, true];

        for (runners, admits) in cases.iter().zip(expected) {
            assert_eq!(all_matching_busy(runners, label), admits);
            assert_eq!(Admission::evaluate(runners, label).idle == 0, admits);
        }
    }
}
