mod codegen_tests;
