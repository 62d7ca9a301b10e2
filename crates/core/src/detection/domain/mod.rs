pub mod person_detector;
