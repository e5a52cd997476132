mod diary_tests;
mod picker_tests;
